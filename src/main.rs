//! Csscade command-line binary

use csscade::{CascadeError, CssCli};
use std::process;

fn main() {
    let mut cli = CssCli::new();

    match cli.run() {
        Ok(()) => {}
        Err(CascadeError::Io(e)) => {
            eprintln!("IO Error: {}", e);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
