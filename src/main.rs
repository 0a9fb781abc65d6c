fn main() {
    if let Err(err) = sonarchat::cli::main() {
        eprintln!("❌ {err}");
        std::process::exit(1);
    }
}
