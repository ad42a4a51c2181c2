use std::path::PathBuf;
use std::process::Command;

/// Node-installed CLIs that are `.cmd` shims on Windows.
const NODE_SHIMS: &[&str] = &["asc", "npx", "npm"];

/// Build a [`Command`] for `program`.
///
/// On Windows, npm-installed binaries are `.cmd` shims and spawning `asc` directly via
/// `CreateProcess` does not resolve `.cmd` via PATHEXT.
pub fn command(program: &str) -> Command {
    if cfg!(windows) && NODE_SHIMS.contains(&program) {
        Command::new(format!("{program}.cmd"))
    } else {
        Command::new(program)
    }
}

#[derive(Debug, Clone)]
pub struct ToolStatus {
    pub name: &'static str,
    pub purpose: &'static str,
    pub path: Option<PathBuf>,
    pub hints: &'static [&'static str],
}

/// Look up the external programs a build can use.
pub fn detect_tools() -> Vec<ToolStatus> {
    vec![
        ToolStatus {
            name: "asc",
            purpose: "AssemblyScript compiler",
            path: find_any(&["asc", "asc.cmd"]),
            hints: &[
                "npm install --save-dev assemblyscript (then use `npx asc` or add node_modules/.bin to PATH)",
            ],
        },
        ToolStatus {
            name: "npx",
            purpose: "runs the project-local asc",
            path: find_any(&["npx", "npx.cmd"]),
            hints: &["ships with npm; install Node.js"],
        },
        ToolStatus {
            name: "node",
            purpose: "JavaScript runtime used by asc",
            path: find_any(&["node", "node.exe"]),
            hints: &[
                "Linux:   sudo apt-get install nodejs",
                "macOS:   brew install node",
                "Windows: winget install OpenJS.NodeJS",
            ],
        },
    ]
}

fn find_any(candidates: &[&str]) -> Option<PathBuf> {
    candidates.iter().find_map(|cand| which::which(cand).ok())
}

pub fn print_tools(tools: &[ToolStatus]) {
    println!("external dependencies:");
    println!();
    for tool in tools {
        match &tool.path {
            Some(path) => println!("{} ({}): FOUND ({})", tool.name, tool.purpose, path.display()),
            None => {
                println!("{} ({}): MISSING", tool.name, tool.purpose);
                for hint in tool.hints {
                    println!("  - {hint}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_programs_are_spawned_as_named() {
        assert_eq!(command("node-gyp").get_program(), "node-gyp");
        let asc = command("asc");
        if cfg!(windows) {
            assert_eq!(asc.get_program(), "asc.cmd");
        } else {
            assert_eq!(asc.get_program(), "asc");
        }
    }

    #[test]
    fn reports_every_tool() {
        let names: Vec<_> = detect_tools().iter().map(|t| t.name).collect();
        assert_eq!(names, ["asc", "npx", "node"]);
    }
}
