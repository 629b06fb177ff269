use anyhow::Result;

fn main() -> Result<()> {
    judgebox::cli::run()
}
