/// I2C address of the case microcontroller.
pub const DEVICE_ADDRESS: u16 = 0x1A;

/// The single control register.
pub const CONTROL_REGISTER: u8 = 0x00;

/// Highest fan speed accepted by the microcontroller.
pub const MAX_FAN_SPEED: u8 = 100;

/// Tells the microcontroller the host is fully off; it cuts power and the LED.
pub const POWER_OFF_SENTINEL: u8 = 0xFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Fan duty cycle in percent. Values above 100 are clamped.
    FanSpeed(u8),
    PowerOff,
}

impl Command {
    pub fn to_byte(self) -> u8 {
        match self {
            Command::FanSpeed(speed) => speed.min(MAX_FAN_SPEED),
            Command::PowerOff => POWER_OFF_SENTINEL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fan_speed_is_clamped() {
        assert_eq!(Command::FanSpeed(0).to_byte(), 0);
        assert_eq!(Command::FanSpeed(55).to_byte(), 55);
        assert_eq!(Command::FanSpeed(100).to_byte(), 100);
        assert_eq!(Command::FanSpeed(250).to_byte(), 100);
    }

    #[test]
    fn power_off_is_the_sentinel() {
        assert_eq!(Command::PowerOff.to_byte(), 0xFF);
    }
}
