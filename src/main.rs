//! pubtest CLI entry point

fn main() {
    pubtest::cli::run();
}
