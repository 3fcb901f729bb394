fn main() -> anyhow::Result<()> {
    blogtui::cli::run()
}
