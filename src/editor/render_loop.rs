/// Invoked once the render it was queued for has settled
pub type RenderCallback = Box<dyn FnOnce()>;

/// Single-flight render scheduling.
///
/// Any number of requests between two ticks collapse into one render; the waiters queued
/// for it are handed back together, in the order they were queued.
#[derive(Default)]
pub struct RenderLoop {
    pending: bool,
    waiters: Vec<RenderCallback>,
    stopped: bool,
}

impl std::fmt::Debug for RenderLoop {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("pending", &self.pending)
            .field("waiters", &self.waiters.len())
            .field("stopped", &self.stopped)
            .finish()
    }
}

impl RenderLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&mut self, callback: Option<RenderCallback>) {
        if self.stopped {
            log::debug!("render requested while the loop is stopped, ignoring");
            return;
        }
        self.pending = true;
        if let Some(callback) = callback {
            self.waiters.push(callback);
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    pub fn waiting(&self) -> usize {
        self.waiters.len()
    }

    /// Claims the pending render for this frame, if any, along with its waiters
    pub fn take_pending(&mut self) -> Option<Vec<RenderCallback>> {
        if !self.pending || self.stopped {
            return None;
        }
        self.pending = false;
        Some(std::mem::take(&mut self.waiters))
    }

    /// Cancels the pending render and drops every queued callback
    pub fn stop(&mut self) {
        self.stopped = true;
        self.pending = false;
        self.waiters.clear();
    }

    pub fn start(&mut self) {
        self.stopped = false;
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_coalesce_into_one_claim() {
        let mut render_loop = RenderLoop::new();
        render_loop.request(None);
        render_loop.request(Some(Box::new(|| {})));
        render_loop.request(Some(Box::new(|| {})));

        let waiters = render_loop.take_pending().unwrap();
        assert_eq!(waiters.len(), 2);
        assert!(render_loop.take_pending().is_none());
    }

    #[test]
    fn stop_drops_waiters_and_ignores_requests() {
        let mut render_loop = RenderLoop::new();
        render_loop.request(Some(Box::new(|| {})));
        render_loop.stop();
        assert_eq!(render_loop.waiting(), 0);

        render_loop.request(None);
        assert!(render_loop.take_pending().is_none());

        render_loop.start();
        render_loop.request(None);
        assert!(render_loop.take_pending().is_some());
    }
}
