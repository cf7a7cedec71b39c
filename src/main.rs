#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_time::Instant;
use {defmt_rtt as _, panic_probe as _};

use scope_demo::{tasks::random_walk_task, walk::seed_from_entropy, Board};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting scope demo: random walk over serial");
    let board = Board::init();

    // seeded once; the walk never re-seeds
    let seed = seed_from_entropy(board.boot_stamp, Instant::now().as_ticks(), &board.uid);

    spawner
        .spawn(random_walk_task(board.serial_tx, board.led, seed))
        .unwrap();
    info!("Random walk task spawned on main executor");

    core::future::pending::<()>().await;
}
