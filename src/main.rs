use sloe_chess::uci;

fn main() {
    if let Err(err) = uci::run_stdio_loop() {
        eprintln!("fatal: {err}");
        std::process::exit(1);
    }
}
