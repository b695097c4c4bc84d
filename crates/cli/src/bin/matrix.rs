use anyhow::Result;

fn main() -> Result<()> {
    matrix_cli::main_entry()
}
