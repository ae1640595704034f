fn main() {
    std::process::exit(git_herd::app::startup::startup());
}
