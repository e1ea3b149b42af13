fn main() {
    env_logger::init();
    glowbug::interface::cli::run();
}
