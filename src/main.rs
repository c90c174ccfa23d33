fn main() -> anyhow::Result<()> {
    operadoras::cli::run()
}
