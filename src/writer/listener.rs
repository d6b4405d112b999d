// Modification notifications and veto

use std::path::Path;

/// Raised by a listener to stop a write before the original file is touched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyVeto {
    pub reason: String,
}

impl ModifyVeto {
    pub fn new(reason: impl Into<String>) -> Self {
        ModifyVeto { reason: reason.into() }
    }
}

/// Receives notifications around a write or delete.
///
/// Both pre-commit hooks may veto. Once the commit has started no further
/// veto is possible.
pub trait AudioFileModificationListener {
    /// Called before the new content is serialised
    fn file_will_be_modified(&self, _path: &Path, _delete: bool) -> Result<(), ModifyVeto> {
        Ok(())
    }

    /// Called once the new content is staged in `temp`, before it replaces `path`
    fn file_modified(&self, _path: &Path, _temp: &Path) -> Result<(), ModifyVeto> {
        Ok(())
    }

    /// Called after the new content has been committed to `path`
    fn file_operation_finished(&self, _path: &Path) {}
}

/// Broadcasts to any number of registered listeners.
///
/// The first veto wins and later listeners are not asked.
#[derive(Default)]
pub struct ModificationHandler {
    listeners: Vec<Box<dyn AudioFileModificationListener>>,
}

impl ModificationHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_listener(&mut self, listener: Box<dyn AudioFileModificationListener>) {
        self.listeners.push(listener);
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl AudioFileModificationListener for ModificationHandler {
    fn file_will_be_modified(&self, path: &Path, delete: bool) -> Result<(), ModifyVeto> {
        self.listeners
            .iter()
            .try_for_each(|listener| listener.file_will_be_modified(path, delete))
    }

    fn file_modified(&self, path: &Path, temp: &Path) -> Result<(), ModifyVeto> {
        self.listeners
            .iter()
            .try_for_each(|listener| listener.file_modified(path, temp))
    }

    fn file_operation_finished(&self, path: &Path) {
        for listener in &self.listeners {
            listener.file_operation_finished(path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        name: &'static str,
        veto: bool,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl AudioFileModificationListener for Recorder {
        fn file_will_be_modified(&self, _path: &Path, _delete: bool) -> Result<(), ModifyVeto> {
            self.log.borrow_mut().push(self.name.to_string());
            if self.veto {
                Err(ModifyVeto::new(self.name))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn first_veto_stops_broadcast() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut handler = ModificationHandler::new();
        for (name, veto) in [("a", false), ("b", true), ("c", false)] {
            handler.add_listener(Box::new(Recorder {
                name,
                veto,
                log: log.clone(),
            }));
        }

        let veto = handler.file_will_be_modified(Path::new("x"), false).unwrap_err();
        assert_eq!(veto.reason, "b");
        assert_eq!(*log.borrow(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(handler.len(), 3);
    }
}
