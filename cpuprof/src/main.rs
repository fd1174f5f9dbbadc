fn main() -> anyhow::Result<()> {
    cpuprof_cli::run()
}
