use std::{fmt::Display, hash::Hash};

use dashmap::DashSet;
use log::{debug, info};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    core::{
        context::{ContextValue, ExecutionContext},
        item::{ItemProcessor, ItemProcessorResult},
    },
    BatchError,
};

/// Step context key holding the keys seen up to the last committed chunk.
pub const SEEN_KEYS_KEY: &str = "dedupe.seen.keys";

/// Keys seen during one step run.
///
/// Create a new set for every run: a run never sees the keys of another. A
/// restarted run gets back the keys of its committed chunks through
/// [`DuplicateCheckProcessor`].
#[derive(Debug)]
pub struct SeenKeys<K: Eq + Hash> {
    keys: DashSet<K>,
}

impl<K: Eq + Hash> Default for SeenKeys<K> {
    fn default() -> Self {
        Self {
            keys: DashSet::new(),
        }
    }
}

impl<K: Eq + Hash> SeenKeys<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key`; returns `true` if it was not seen before.
    pub fn insert(&self, key: K) -> bool {
        self.keys.insert(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K: Eq + Hash + Clone> SeenKeys<K> {
    /// Copy of the keys, in no particular order.
    pub fn keys(&self) -> Vec<K> {
        self.keys.iter().map(|entry| entry.key().clone()).collect()
    }
}

/// Processor filtering out items whose key was already seen, unless
/// duplicates are allowed.
///
/// The first item for a key goes through; later ones are filtered.
///
/// # Examples
///
/// ```
/// use spring_batch_example::core::item::ItemProcessor;
/// use spring_batch_example::item::dedupe::{DuplicateCheckProcessor, SeenKeys};
///
/// let seen = SeenKeys::new();
/// let processor = DuplicateCheckProcessor::new(&seen, |name: &String| name.clone());
///
/// assert!(processor.process(&"멤버1".to_string()).unwrap().is_some());
/// assert!(processor.process(&"멤버1".to_string()).unwrap().is_none());
/// ```
pub struct DuplicateCheckProcessor<'a, T, K: Eq + Hash> {
    seen: &'a SeenKeys<K>,
    key: Box<dyn Fn(&T) -> K + 'a>,
    allow_duplicate: bool,
}

impl<'a, T, K: Eq + Hash> DuplicateCheckProcessor<'a, T, K> {
    pub fn new<F>(seen: &'a SeenKeys<K>, key: F) -> Self
    where
        F: Fn(&T) -> K + 'a,
    {
        Self {
            seen,
            key: Box::new(key),
            allow_duplicate: false,
        }
    }

    /// When `true`, every item goes through and no key is recorded.
    pub fn allow_duplicate(mut self, allow_duplicate: bool) -> Self {
        self.allow_duplicate = allow_duplicate;
        self
    }
}

fn to_processor_error<E: Display>(error: E) -> BatchError {
    BatchError::ItemProcessor(format!("seen keys: {}", error))
}

impl<T, K> ItemProcessor<T, T> for DuplicateCheckProcessor<'_, T, K>
where
    T: Clone,
    K: Eq + Hash + Clone + Serialize + DeserializeOwned,
{
    fn process(&self, item: &T) -> ItemProcessorResult<T> {
        if self.allow_duplicate {
            return Ok(Some(item.clone()));
        }

        if self.seen.insert((self.key)(item)) {
            Ok(Some(item.clone()))
        } else {
            debug!("Duplicate item filtered");
            Ok(None)
        }
    }

    /// Restores the keys saved by the last committed chunk of a failed run.
    fn open(&self, context: &ExecutionContext) -> Result<(), BatchError> {
        let Some(ContextValue::String(stored)) = context.get(SEEN_KEYS_KEY) else {
            return Ok(());
        };

        let keys: Vec<K> = serde_json::from_str(stored).map_err(to_processor_error)?;
        info!("Restoring {} seen keys", keys.len());
        for key in keys {
            self.seen.insert(key);
        }
        Ok(())
    }

    fn update(&self, context: &mut ExecutionContext) -> Result<(), BatchError> {
        if self.allow_duplicate {
            return Ok(());
        }

        let stored = serde_json::to_string(&self.seen.keys()).map_err(to_processor_error)?;
        context.put(SEEN_KEYS_KEY, stored);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::core::{context::ExecutionContext, item::ItemProcessor};

    use super::{DuplicateCheckProcessor, SeenKeys, SEEN_KEYS_KEY};

    #[derive(Clone, Debug, PartialEq)]
    struct Member {
        id: u32,
        name: String,
    }

    fn members() -> Vec<Member> {
        (1..=30)
            .map(|id| Member {
                id,
                name: format!("멤버{}", (id - 1) % 10 + 1),
            })
            .collect()
    }

    #[test]
    fn first_item_per_key_should_win() {
        let seen = SeenKeys::new();
        let processor = DuplicateCheckProcessor::new(&seen, |member: &Member| member.name.clone());

        let kept: Vec<Member> = members()
            .iter()
            .filter_map(|member| processor.process(member).unwrap())
            .collect();

        assert_eq!(kept.len(), 10);
        assert_eq!(kept.first().map(|m| m.id), Some(1));
        assert_eq!(kept.last().map(|m| m.id), Some(10));
        assert_eq!(seen.len(), 10);
    }

    #[test]
    fn allow_duplicate_should_keep_everything() {
        let seen = SeenKeys::new();
        let processor = DuplicateCheckProcessor::new(&seen, |member: &Member| member.name.clone())
            .allow_duplicate(true);

        let kept = members()
            .iter()
            .filter_map(|member| processor.process(member).unwrap())
            .count();

        assert_eq!(kept, 30);
        assert!(seen.is_empty());
    }

    #[test]
    fn committed_keys_should_be_restored_on_restart() {
        let mut context = ExecutionContext::new();
        {
            let seen = SeenKeys::new();
            let processor =
                DuplicateCheckProcessor::new(&seen, |member: &Member| member.name.clone());
            members()[..3]
                .iter()
                .for_each(|member| assert!(processor.process(member).unwrap().is_some()));
            processor.update(&mut context).unwrap();
        }

        let seen = SeenKeys::new();
        let processor = DuplicateCheckProcessor::new(&seen, |member: &Member| member.name.clone());
        processor.open(&context).unwrap();

        let kept: Vec<u32> = members()[3..]
            .iter()
            .filter_map(|member| processor.process(member).unwrap())
            .map(|member| member.id)
            .collect();

        assert_eq!(kept, (4..=10).collect::<Vec<u32>>());
    }

    #[test]
    fn allowed_duplicates_should_save_nothing() {
        let mut context = ExecutionContext::new();
        let seen = SeenKeys::new();
        let processor = DuplicateCheckProcessor::new(&seen, |member: &Member| member.name.clone())
            .allow_duplicate(true);

        processor.process(&members()[0]).unwrap();
        processor.update(&mut context).unwrap();

        assert!(!context.contains_key(SEEN_KEYS_KEY));
    }

    #[test]
    fn fresh_keys_should_start_empty() {
        let first_run = SeenKeys::new();
        assert!(first_run.insert("멤버1".to_string()));

        let second_run: SeenKeys<String> = SeenKeys::new();
        assert!(!second_run.contains(&"멤버1".to_string()));
        assert!(second_run.insert("멤버1".to_string()));
    }
}
