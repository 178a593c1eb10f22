fn main() {
    if let Err(e) = hybrid_rag::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
