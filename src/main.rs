fn main() -> anyhow::Result<()> {
    greeneats::cli::run()
}
