//! Fan control and the shutdown hook writing through one shared channel.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, bail};
use argononed::{
    config::{Config, Settings},
    drivers::argon_one::{
        BusChannel,
        device_io::DeviceIO,
        protocol::{Command, POWER_OFF_SENTINEL},
    },
    fan_controller::FanController,
    power_off::{PowerOffKind, signal_power_off},
    sensors::TemperatureSensor,
};
use async_trait::async_trait;
use pretty_assertions::assert_eq;

/// Records every write and fails if two writes ever overlap.
#[derive(Clone, Default)]
struct ExclusiveDevice {
    busy: Arc<AtomicBool>,
    writes: Arc<Mutex<Vec<u8>>>,
}

impl DeviceIO for ExclusiveDevice {
    fn write_register(&self, _register: u8, value: u8) -> Result<()> {
        if self.busy.swap(true, Ordering::SeqCst) {
            bail!("overlapping write of {value:#04x}");
        }
        std::thread::sleep(Duration::from_millis(1));
        self.writes.lock().unwrap().push(value);
        self.busy.store(false, Ordering::SeqCst);
        Ok(())
    }
}

struct Hot;

#[async_trait]
impl TemperatureSensor for Hot {
    async fn read_temperature(&self) -> Result<f32> {
        Ok(80.0)
    }
}

fn fan(bus: BusChannel) -> FanController {
    let settings = Settings::try_from(&Config::default()).unwrap();
    FanController::new(&settings, Arc::new(Hot), bus)
}

#[tokio::test]
async fn power_off_after_fan_leaves_sentinel_last() {
    let device = ExclusiveDevice::default();
    let bus = BusChannel::new(device.clone());
    let mut fan = fan(bus.clone());

    let speed = fan.decide(fan.sample().await).speed;
    fan.apply(speed).await.unwrap();
    signal_power_off(&bus, PowerOffKind::Poweroff).await;

    assert_eq!(*device.writes.lock().unwrap(), vec![100, 0, POWER_OFF_SENTINEL]);
}

#[tokio::test]
async fn reboot_leaves_fan_stopped() {
    let device = ExclusiveDevice::default();
    let bus = BusChannel::new(device.clone());
    let mut fan = fan(bus.clone());

    fan.apply(100).await.unwrap();
    signal_power_off(&bus, PowerOffKind::Reboot).await;

    assert_eq!(device.writes.lock().unwrap().last(), Some(&0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_senders_never_interleave() {
    let device = ExclusiveDevice::default();
    let bus = BusChannel::new(device.clone());

    let mut handles = Vec::new();
    for speed in 0..32u8 {
        let bus = bus.clone();
        handles.push(tokio::spawn(async move {
            bus.send(Command::FanSpeed(speed)).await
        }));
    }
    let shutdown_bus = bus.clone();
    handles.push(tokio::spawn(async move {
        shutdown_bus.send(Command::PowerOff).await
    }));

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let writes = device.writes.lock().unwrap();
    assert_eq!(writes.len(), 33);
    assert!(writes.contains(&POWER_OFF_SENTINEL));
}
