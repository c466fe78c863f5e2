use std::cell::RefCell;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tillsync_engine::Connectivity;

/// Shared online/offline switch. Clones observe the same flag, so a test
/// can hold one handle while the coordinator holds another.
#[derive(Debug, Clone)]
pub struct SharedConnectivity {
    online: Arc<AtomicBool>,
}

impl SharedConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Connectivity for SharedConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

/// Connectivity whose answers are scripted per check, for exercising
/// transitions that happen mid-drain. Once the script runs out, answers
/// fall back to `fallback`.
#[derive(Debug)]
pub struct ScriptedConnectivity {
    answers: RefCell<VecDeque<bool>>,
    fallback: bool,
}

impl ScriptedConnectivity {
    pub fn new(answers: impl IntoIterator<Item = bool>, fallback: bool) -> Self {
        Self {
            answers: RefCell::new(answers.into_iter().collect()),
            fallback,
        }
    }
}

impl Connectivity for ScriptedConnectivity {
    fn is_online(&self) -> bool {
        self.answers
            .borrow_mut()
            .pop_front()
            .unwrap_or(self.fallback)
    }
}
