use std::collections::VecDeque;
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::bus::TargetKind;
use crate::client::{Client, ClientInner};
use crate::error::{Error, Result};
use crate::notification::Notification;
use crate::report::{Input, Report};
use crate::target::Target;

/// Feedback the host sent to a [`Pad`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Output {
    Rumble { large: u8, small: u8 },
    Led(u8),
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Rumble { large, small } => write!(f, "rumble large={large} small={small}"),
            Output::Led(number) => write!(f, "led {number}"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Feedback {
    large: u8,
    small: u8,
    led: u8,
}

/// A plugged-in Xbox 360 pad with its running input state and a queue of
/// host feedback.
pub struct Pad {
    client: Arc<ClientInner>,
    target: Target,
    report: Report,
    notifications: Receiver<Notification>,
    latest: Feedback,
    queue: VecDeque<Output>,
}

impl Client {
    /// Allocate an Xbox 360 target, plug it in and subscribe to its
    /// feedback.
    ///
    /// If the subscription fails the target is unplugged again. When that
    /// fails too, both errors are returned in [`Error::PlugIn`].
    pub fn plug_in(&self) -> Result<Pad> {
        let mut target = Target::alloc(self.bus().clone(), TargetKind::X360);
        self.add_target(&mut target)?;

        let (tx, rx) = unbounded();
        if let Err(err) = self.register_notification(&mut target, tx, forward) {
            return match self.remove_target(&mut target) {
                Ok(()) => Err(err),
                Err(cleanup) => Err(Error::PlugIn {
                    source: Box::new(err),
                    cleanup: Box::new(cleanup),
                }),
            };
        }

        log::debug!("pad {:?} plugged in", target.raw());
        Ok(Pad {
            client: self.inner().clone(),
            target,
            report: Report::default(),
            notifications: rx,
            latest: Feedback::default(),
            queue: VecDeque::new(),
        })
    }
}

fn forward(notification: &Notification, tx: &mut Sender<Notification>) {
    if let Err(err) = tx.send(*notification) {
        log::error!(
            "dropping notification for target {:?}: {err}",
            notification.target
        );
    }
}

impl Pad {
    /// Apply one input change and push the resulting report.
    pub fn put_input(&mut self, input: Input) -> Result<()> {
        self.report.apply(input);
        self.client.update(&self.target, &self.report)
    }

    /// Replace the whole input state and push it.
    pub fn set_report(&mut self, report: Report) -> Result<()> {
        self.report = report;
        self.client.update(&self.target, &self.report)
    }

    pub fn report(&self) -> &Report {
        &self.report
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Next feedback change, oldest first.
    ///
    /// Notifications that repeat the previous motor or LED values are
    /// skipped.
    pub fn next_output(&mut self) -> Option<Output> {
        for notification in self.notifications.try_iter() {
            let next = Feedback {
                large: notification.large_motor,
                small: notification.small_motor,
                led: notification.led_number,
            };
            if (next.large, next.small) != (self.latest.large, self.latest.small) {
                self.queue.push_back(Output::Rumble {
                    large: next.large,
                    small: next.small,
                });
            }
            if next.led != self.latest.led {
                self.queue.push_back(Output::Led(next.led));
            }
            self.latest = next;
        }
        self.queue.pop_front()
    }

    /// Unsubscribe and unplug, surfacing errors the drop path would only log.
    pub fn unplug(mut self) -> Result<()> {
        self.target.unregister_notification()?;
        self.client.remove_target(&mut self.target)?;
        log::debug!("pad {:?} unplugged", self.target.raw());
        Ok(())
    }
}

impl std::fmt::Debug for Pad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pad")
            .field("target", &self.target)
            .field("report", &self.report)
            .field("queued", &self.queue.len())
            .finish_non_exhaustive()
    }
}
