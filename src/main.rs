fn main() {
    if let Err(err) = csv_lineage::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
