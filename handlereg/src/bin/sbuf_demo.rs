//! Buffer registry demo
//!
//! Several threads append to one shared buffer through the registry, then the
//! main thread reads the interleaved result back. Run with
//! `RUST_LOG=debug` to watch table growth.

use std::sync::Arc;
use std::thread;

use handlereg::sbuf::{BufferRegistry, DEFAULT_BUFFER_SIZE, DEFAULT_DESTROY_TIMEOUT};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let registry = Arc::new(BufferRegistry::new());
    let shared = registry.create(DEFAULT_BUFFER_SIZE)?;

    let workers: Vec<_> = (b'a'..=b'f')
        .map(|letter| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                // Each worker also gets a private buffer, which grows the table.
                let own = registry.create(16)?;
                for _ in 0..8 {
                    registry.putc(letter, &shared)?;
                    registry.putc(letter.to_ascii_uppercase(), &own)?;
                }
                registry.destroy(own, DEFAULT_DESTROY_TIMEOUT)
            })
        })
        .collect();

    for worker in workers {
        match worker.join() {
            Ok(result) => result?,
            Err(_) => return Err("worker thread panicked".into()),
        }
    }

    registry.rewind(&shared)?;
    let mut out = Vec::new();
    while let Some(byte) = registry.getc(&shared)? {
        out.push(byte);
    }
    println!("{}", String::from_utf8_lossy(&out));
    println!(
        "buffers: used {}, live {}, allocated {}",
        registry.count_used(),
        registry.count_live(),
        registry.count_allocated()
    );

    registry.destroy(shared, DEFAULT_DESTROY_TIMEOUT)?;
    Ok(())
}
