fn main() -> anyhow::Result<()> {
    plain_notes::cli::run()
}
