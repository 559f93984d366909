//! slotgrid main entrypoint.

use slotgrid::run;

fn main() {
    if let Err(e) = run() {
        slotgrid::ui::messages::error(format!("Error: {e}"));
        std::process::exit(1);
    }
}
