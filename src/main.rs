fn main() {
    profilometer_pipeline::cli::run();
}
