use std::cell::Cell;
use std::rc::Rc;

/// Window-wide pointer routing. While a guard is held the host delivers every
/// pointer move and release to the scene, whatever is under the cursor and even
/// outside the surface's hit region.
#[derive(Debug, Clone, Default)]
pub struct PointerCapture {
    held: Rc<Cell<bool>>,
}

impl PointerCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the capture. `None` if another gesture holds it.
    pub fn acquire(&self) -> Option<CaptureGuard> {
        if self.held.get() {
            return None;
        }
        self.held.set(true);
        log::trace!("pointer capture acquired");
        Some(CaptureGuard {
            held: Rc::clone(&self.held),
        })
    }

    pub fn is_held(&self) -> bool {
        self.held.get()
    }
}

/// Releases the capture when dropped, on every path out of a gesture.
#[derive(Debug)]
pub struct CaptureGuard {
    held: Rc<Cell<bool>>,
}

impl Drop for CaptureGuard {
    fn drop(&mut self) {
        self.held.set(false);
        log::trace!("pointer capture released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_is_exclusive() {
        let capture = PointerCapture::new();
        let guard = capture.acquire();
        assert!(guard.is_some());
        assert!(capture.is_held());
        assert!(capture.acquire().is_none());
    }

    #[test]
    fn drop_releases() {
        let capture = PointerCapture::new();
        {
            let _guard = capture.acquire().unwrap();
            assert!(capture.is_held());
        }
        assert!(!capture.is_held());
        assert!(capture.acquire().is_some());
    }

    #[test]
    fn clones_share_state() {
        let capture = PointerCapture::new();
        let other = capture.clone();
        let _guard = capture.acquire().unwrap();
        assert!(other.is_held());
    }
}
