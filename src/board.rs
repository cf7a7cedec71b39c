use embassy_stm32::mode::Async;
use embassy_stm32::rtc::{Rtc, RtcConfig};
use embassy_stm32::usart::{Config as UsartConfig, UartTx};
use embassy_stm32::{
    gpio::{Flex, Level, Output, Speed},
    rcc, uid, Config,
};

use crate::config::UART_BAUDRATE;

// ── Board struct ──────────────────────────────────────────
// NUCLEO-G071RB: ST-LINK VCP on USART2 (PA2), user LED LD4 on PA5,
// DHT22 data on PA0 (A0) with an external 4.7k pull-up.
pub struct Board {
    pub serial_tx: UartTx<'static, Async>, // DMA
    pub led: Output<'static>,
    pub dht22: Flex<'static>,
    /// 96-bit factory unique ID.
    pub uid: [u8; 12],
    /// Boot counter in the high word, RTC seconds into the month in the low
    /// word. Differs from one reset to the next.
    pub boot_stamp: u64,
}

// TAMP_BKP0R; survives resets as long as VDD or VBAT stays up
const BOOT_COUNT_REG: usize = 0;

impl Board {
    pub fn init() -> Self {
        let mut config = Config::default();

        // Enable HSI and configure PLL for 64MHz
        config.rcc.hsi = Some(rcc::Hsi {
            sys_div: rcc::HsiSysDiv::DIV1,
        });
        config.rcc.pll = Some(rcc::Pll {
            source: rcc::PllSource::HSI,    // Use HSI as PLL source
            prediv: rcc::PllPreDiv::DIV2,   // 16MHz / 2 = 8MHz
            mul: rcc::PllMul::MUL16,        // 8MHz * 16 = 128MHz
            divp: None,                     // Not used
            divq: None,                     // Not used
            divr: Some(rcc::PllRDiv::DIV2), // 128MHz / 2 = 64MHz
        });
        config.rcc.sys = rcc::Sysclk::PLL1_R;
        // 32.768 kHz crystal X2 on the Nucleo clocks the RTC
        config.rcc.ls = rcc::LsConfig::default_lse();
        let p = embassy_stm32::init(config);

        let led = Output::new(p.PA5, Level::Low, Speed::Low);
        let dht22 = Flex::new(p.PA0);

        let mut us_cfg = UsartConfig::default();
        us_cfg.baudrate = UART_BAUDRATE;

        // USART2 TX only (DMA CH1); nothing is ever read back
        let serial_tx = UartTx::new(p.USART2, p.PA2, p.DMA1_CH1, us_cfg).unwrap();

        let rtc = Rtc::new(p.RTC, RtcConfig::default());
        let boot_stamp = read_boot_stamp(&rtc);

        Self {
            serial_tx,
            led,
            dht22,
            uid: *uid::uid(),
            boot_stamp,
        }
    }
}

fn read_boot_stamp(rtc: &Rtc) -> u64 {
    let boots = rtc
        .read_backup_register(BOOT_COUNT_REG)
        .unwrap_or(0)
        .wrapping_add(1);
    rtc.write_backup_register(BOOT_COUNT_REG, boots);

    // the calendar is not valid until someone sets it; the counter still moves
    let seconds = match rtc.now() {
        Ok(t) => {
            (t.day() as u32) * 86_400
                + (t.hour() as u32) * 3_600
                + (t.minute() as u32) * 60
                + t.second() as u32
        }
        Err(_) => {
            warn!("RTC calendar unreadable, seeding from boot count only");
            0
        }
    };
    info!("boot {} at RTC second {}", boots, seconds);

    (boots as u64) << 32 | seconds as u64
}
