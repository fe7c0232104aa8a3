fn main() {
    if let Err(err) = treadmill_lib::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
