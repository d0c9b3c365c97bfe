fn main() {
    if let Err(err) = sensory_pulse_lib::run() {
        eprintln!("sensory-pulse: {err:#}");
        std::process::exit(1);
    }
}
