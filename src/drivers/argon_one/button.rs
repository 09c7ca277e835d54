use std::{
    pin::Pin,
    task::{Context, Poll},
    time::{Duration, Instant},
};

use anyhow::{Context as _, Result};
use futures::Stream;
use log::info;
use rppal::gpio::{Event, Gpio, InputPin, Trigger};
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;

use crate::power_button::{Edge, EdgeKind, EdgeStream};

/// BCM pin the case power button is wired to.
pub const POWER_BUTTON_PIN: u8 = 4;

/// Power button input delivering debounced edges as a stream.
///
/// The button pulls the pin high while pressed, so a rising edge is a press
/// and a falling edge a release. Edges are stamped inside the interrupt
/// callback so queueing delay does not count towards the hold time.
pub struct GpioButton {
    _pin: InputPin,
    edges: UnboundedReceiverStream<Edge>,
}

impl GpioButton {
    pub fn open(pin: u8, debounce: Duration) -> Result<Self> {
        let mut input = Gpio::new()
            .context("Failed to access GPIO")?
            .get(pin)
            .with_context(|| format!("Power button pin {pin} unavailable"))?
            .into_input_pulldown();

        let (tx, rx) = mpsc::unbounded_channel();
        input
            .set_async_interrupt(Trigger::Both, Some(debounce), move |event: Event| {
                let kind = match event.trigger {
                    Trigger::RisingEdge => EdgeKind::Pressed,
                    Trigger::FallingEdge => EdgeKind::Released,
                    _ => return,
                };
                // The receiver is gone only while the daemon shuts down.
                let _ = tx.send(Edge::new(kind, Instant::now()));
            })
            .with_context(|| format!("Failed to watch power button pin {pin}"))?;

        info!("Watching power button on GPIO {pin} (debounce {debounce:?})");
        Ok(Self {
            _pin: input,
            edges: UnboundedReceiverStream::new(rx),
        })
    }

    pub fn into_stream(self) -> EdgeStream {
        Box::pin(self)
    }
}

impl Stream for GpioButton {
    type Item = Edge;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Edge>> {
        Pin::new(&mut self.edges).poll_next(cx)
    }
}
