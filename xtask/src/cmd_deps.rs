use wat_splice::tools::{detect_tools, print_tools};

pub fn cmd() {
    print_tools(&detect_tools());
}
