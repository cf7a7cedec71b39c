#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use {defmt_rtt as _, panic_probe as _};

use scope_demo::{drivers::Dht22, tasks::humiture_task, Board};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Starting scope demo: DHT22 humiture over serial");
    let board = Board::init();
    let sensor = Dht22::new(board.dht22);

    spawner
        .spawn(humiture_task(sensor, board.serial_tx, board.led))
        .unwrap();
    info!("Humiture task spawned on main executor");

    core::future::pending::<()>().await;
}
