//! Shared test processors: sources with controllable cacheability and a
//! character-transforming pass-through.

#![allow(dead_code)]

use anyhow::anyhow;
use parking_lot::Mutex;
use sluice_engine::prelude::*;
use sluice_engine::read::read_input_log;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

pub const TEXT_SOURCE_TYPE: &str = "test::text-source";
pub const UPPERCASE_TYPE: &str = "test::uppercase";

// =============================================================================
// TextSource: cacheable from the start, with a settable validity
// =============================================================================

struct TextShared {
    text: String,
    reads: AtomicUsize,
    validity: Mutex<Validity>,
}

/// Emits a fixed `<text>` document. Key is a digest of the text, validity is
/// settable, and every actual producer read is counted.
pub struct TextSource {
    base: ProcessorBase,
    shared: Arc<TextShared>,
}

impl TextSource {
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        let shared = Arc::new(TextShared {
            text: text.into(),
            reads: AtomicUsize::new(0),
            validity: Mutex::new(Validity::Timestamp(1_000)),
        });
        let base = ProcessorBase::new(TEXT_SOURCE_TYPE, vec![], vec![PortInfo::new(DATA_PORT)]);
        base.add_output(Arc::new(TextOutput {
            shared: Arc::clone(&shared),
        }))
        .unwrap();
        Arc::new(Self { base, shared })
    }

    pub fn reads(&self) -> usize {
        self.shared.reads.load(Ordering::SeqCst)
    }

    pub fn set_validity(&self, validity: Validity) {
        *self.shared.validity.lock() = validity;
    }
}

impl Processor for TextSource {
    fn base(&self) -> &ProcessorBase {
        &self.base
    }
}

struct TextOutput {
    shared: Arc<TextShared>,
}

impl Output for TextOutput {
    fn processor_type(&self) -> &str {
        TEXT_SOURCE_TYPE
    }

    fn port_name(&self) -> &str {
        DATA_PORT
    }

    fn read(&self, _context: &Arc<ExecutionContext>, receiver: &mut dyn Receiver) -> Result<()> {
        self.shared.reads.fetch_add(1, Ordering::SeqCst);
        receiver.event(&Event::StartDocument)?;
        receiver.event(&Event::start_element("text"))?;
        receiver.event(&Event::characters(self.shared.text.clone()))?;
        receiver.event(&Event::end_element("text"))?;
        receiver.event(&Event::EndDocument)
    }

    fn key(&self, _context: &Arc<ExecutionContext>) -> Option<CacheKey> {
        Some(CacheKey::simple(
            TEXT_SOURCE_TYPE,
            DATA_PORT,
            content_digest(self.shared.text.as_bytes()),
        ))
    }

    fn validity(&self, _context: &Arc<ExecutionContext>) -> Option<Validity> {
        Some(self.shared.validity.lock().clone())
    }
}

// =============================================================================
// UncacheableSource: never proves a key or validity
// =============================================================================

pub struct UncacheableSource {
    base: ProcessorBase,
    shared: Arc<TextShared>,
}

impl UncacheableSource {
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        let shared = Arc::new(TextShared {
            text: text.into(),
            reads: AtomicUsize::new(0),
            validity: Mutex::new(Validity::ZERO),
        });
        let base = ProcessorBase::new(
            "test::uncacheable-source",
            vec![],
            vec![PortInfo::new(DATA_PORT)],
        );
        base.add_output(Arc::new(UncacheableOutput {
            shared: Arc::clone(&shared),
        }))
        .unwrap();
        Arc::new(Self { base, shared })
    }

    pub fn reads(&self) -> usize {
        self.shared.reads.load(Ordering::SeqCst)
    }
}

impl Processor for UncacheableSource {
    fn base(&self) -> &ProcessorBase {
        &self.base
    }
}

struct UncacheableOutput {
    shared: Arc<TextShared>,
}

impl Output for UncacheableOutput {
    fn processor_type(&self) -> &str {
        "test::uncacheable-source"
    }

    fn port_name(&self) -> &str {
        DATA_PORT
    }

    fn read(&self, _context: &Arc<ExecutionContext>, receiver: &mut dyn Receiver) -> Result<()> {
        self.shared.reads.fetch_add(1, Ordering::SeqCst);
        receiver.event(&Event::StartDocument)?;
        receiver.event(&Event::characters(self.shared.text.clone()))?;
        receiver.event(&Event::EndDocument)
    }

    // key and validity stay at the default None: never cacheable.
}

// =============================================================================
// LazyDigestSource: key knowable only after the first producer read
// =============================================================================

struct LazyShared {
    text: String,
    reads: AtomicUsize,
    digest: Mutex<Option<String>>,
}

/// Models a URL-generator-like source whose key is a digest of fetched
/// content: before the first read nothing is provable, afterwards the key is
/// exact.
pub struct LazyDigestSource {
    base: ProcessorBase,
    shared: Arc<LazyShared>,
}

impl LazyDigestSource {
    pub fn new(text: impl Into<String>) -> Arc<Self> {
        let shared = Arc::new(LazyShared {
            text: text.into(),
            reads: AtomicUsize::new(0),
            digest: Mutex::new(None),
        });
        let base = ProcessorBase::new(
            "test::lazy-digest-source",
            vec![],
            vec![PortInfo::new(DATA_PORT)],
        );
        base.add_output(Arc::new(LazyOutput {
            shared: Arc::clone(&shared),
        }))
        .unwrap();
        Arc::new(Self { base, shared })
    }

    pub fn reads(&self) -> usize {
        self.shared.reads.load(Ordering::SeqCst)
    }
}

impl Processor for LazyDigestSource {
    fn base(&self) -> &ProcessorBase {
        &self.base
    }
}

struct LazyOutput {
    shared: Arc<LazyShared>,
}

impl Output for LazyOutput {
    fn processor_type(&self) -> &str {
        "test::lazy-digest-source"
    }

    fn port_name(&self) -> &str {
        DATA_PORT
    }

    fn read(&self, _context: &Arc<ExecutionContext>, receiver: &mut dyn Receiver) -> Result<()> {
        self.shared.reads.fetch_add(1, Ordering::SeqCst);
        *self.shared.digest.lock() = Some(content_digest(self.shared.text.as_bytes()));
        receiver.event(&Event::StartDocument)?;
        receiver.event(&Event::characters(self.shared.text.clone()))?;
        receiver.event(&Event::EndDocument)
    }

    fn key(&self, _context: &Arc<ExecutionContext>) -> Option<CacheKey> {
        self.shared
            .digest
            .lock()
            .clone()
            .map(|digest| CacheKey::internal("lazy-content", digest))
    }

    fn validity(&self, _context: &Arc<ExecutionContext>) -> Option<Validity> {
        Some(Validity::ZERO)
    }
}

// =============================================================================
// BucketedSource: validity derived from the ambient clock, bucketed
// =============================================================================

struct BucketedShared {
    text: String,
    reads: AtomicUsize,
    bucket: Duration,
}

/// A source whose validity is the start of the current time bucket, so all
/// reads within one bucket share one cache entry.
pub struct BucketedSource {
    base: ProcessorBase,
    shared: Arc<BucketedShared>,
}

impl BucketedSource {
    pub fn new(text: impl Into<String>, bucket: Duration) -> Arc<Self> {
        let shared = Arc::new(BucketedShared {
            text: text.into(),
            reads: AtomicUsize::new(0),
            bucket,
        });
        let base = ProcessorBase::new(
            "test::bucketed-source",
            vec![],
            vec![PortInfo::new(DATA_PORT)],
        );
        base.add_output(Arc::new(BucketedOutput {
            shared: Arc::clone(&shared),
        }))
        .unwrap();
        Arc::new(Self { base, shared })
    }

    pub fn reads(&self) -> usize {
        self.shared.reads.load(Ordering::SeqCst)
    }
}

impl Processor for BucketedSource {
    fn base(&self) -> &ProcessorBase {
        &self.base
    }
}

struct BucketedOutput {
    shared: Arc<BucketedShared>,
}

impl Output for BucketedOutput {
    fn processor_type(&self) -> &str {
        "test::bucketed-source"
    }

    fn port_name(&self) -> &str {
        DATA_PORT
    }

    fn read(&self, _context: &Arc<ExecutionContext>, receiver: &mut dyn Receiver) -> Result<()> {
        self.shared.reads.fetch_add(1, Ordering::SeqCst);
        receiver.event(&Event::StartDocument)?;
        receiver.event(&Event::characters(self.shared.text.clone()))?;
        receiver.event(&Event::EndDocument)
    }

    fn key(&self, _context: &Arc<ExecutionContext>) -> Option<CacheKey> {
        Some(CacheKey::simple(
            "test::bucketed-source",
            DATA_PORT,
            content_digest(self.shared.text.as_bytes()),
        ))
    }

    fn validity(&self, context: &Arc<ExecutionContext>) -> Option<Validity> {
        Some(Validity::bucketed(
            context.clock().as_ref(),
            self.shared.bucket,
        ))
    }
}

// =============================================================================
// FailingSource: producer fails mid-stream
// =============================================================================

pub struct FailingSource {
    base: ProcessorBase,
}

impl FailingSource {
    pub fn new() -> Arc<Self> {
        let base = ProcessorBase::new(
            "test::failing-source",
            vec![],
            vec![PortInfo::new(DATA_PORT)],
        );
        base.add_output(Arc::new(FailingOutput)).unwrap();
        Arc::new(Self { base })
    }
}

impl Processor for FailingSource {
    fn base(&self) -> &ProcessorBase {
        &self.base
    }
}

struct FailingOutput;

impl Output for FailingOutput {
    fn processor_type(&self) -> &str {
        "test::failing-source"
    }

    fn port_name(&self) -> &str {
        DATA_PORT
    }

    fn read(&self, _context: &Arc<ExecutionContext>, receiver: &mut dyn Receiver) -> Result<()> {
        receiver.event(&Event::StartDocument)?;
        receiver.event(&Event::characters("partial"))?;
        Err(anyhow!("producer failed mid-stream").into())
    }
}

// =============================================================================
// Uppercase: pass-through transformer over its data input
// =============================================================================

struct UppercaseState {
    base: ProcessorBase,
}

/// Forwards its `data` input, uppercasing character runs. Key and validity
/// aggregate over connected inputs, so cacheability taints through.
pub struct Uppercase {
    state: Arc<UppercaseState>,
}

impl Uppercase {
    pub fn new() -> Arc<Self> {
        let state = Arc::new(UppercaseState {
            base: ProcessorBase::new(
                UPPERCASE_TYPE,
                vec![PortInfo::new(DATA_PORT)],
                vec![PortInfo::new(DATA_PORT)],
            ),
        });
        state
            .base
            .add_output(Arc::new(UppercaseOutput {
                state: Arc::downgrade(&state),
            }))
            .unwrap();
        Arc::new(Self { state })
    }
}

impl Processor for Uppercase {
    fn base(&self) -> &ProcessorBase {
        &self.state.base
    }
}

struct UppercaseOutput {
    state: Weak<UppercaseState>,
}

impl UppercaseOutput {
    fn state(&self) -> Result<Arc<UppercaseState>> {
        self.state
            .upgrade()
            .ok_or_else(|| anyhow!("uppercase processor dropped").into())
    }
}

struct UpcasingReceiver<'a> {
    inner: &'a mut dyn Receiver,
}

impl Receiver for UpcasingReceiver<'_> {
    fn event(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::Characters(text) => self.inner.event(&Event::Characters(text.to_uppercase())),
            other => self.inner.event(other),
        }
    }
}

impl Output for UppercaseOutput {
    fn processor_type(&self) -> &str {
        UPPERCASE_TYPE
    }

    fn port_name(&self) -> &str {
        DATA_PORT
    }

    fn read(&self, context: &Arc<ExecutionContext>, receiver: &mut dyn Receiver) -> Result<()> {
        let state = self.state()?;
        let input = state.base.input_by_name(DATA_PORT)?;
        // Read the input through the cache, then replay the buffered stream.
        let (log, _) = read_input_log(context, &input)?;
        let mut upcasing = UpcasingReceiver { inner: receiver };
        log.replay(&mut upcasing)
    }

    fn key(&self, context: &Arc<ExecutionContext>) -> Option<CacheKey> {
        let state = self.state.upgrade()?;
        sluice_engine::read::transformer_output_key(context, &state.base, DATA_PORT, None)
    }

    fn validity(&self, context: &Arc<ExecutionContext>) -> Option<Validity> {
        let state = self.state.upgrade()?;
        sluice_engine::read::transformer_output_validity(context, &state.base, None)
    }
}

// =============================================================================
// Registry and hook helpers
// =============================================================================

/// Registry with factories for the shared test processor types.
pub fn test_registry() -> ProcessorRegistry {
    let mut registry = ProcessorRegistry::new();
    registry.register(TEXT_SOURCE_TYPE, |config| {
        let text = config
            .get("text")
            .and_then(|value| value.as_str())
            .unwrap_or_default()
            .to_string();
        let processor: Arc<dyn Processor> = TextSource::new(text);
        Ok(processor)
    });
    registry.register(UPPERCASE_TYPE, |_config| {
        let processor: Arc<dyn Processor> = Uppercase::new();
        Ok(processor)
    });
    registry
}

/// Validation hook that counts wraps and otherwise stays invisible: it
/// delegates the stream, key, and validity to the wrapped output.
#[derive(Default)]
pub struct CountingHook {
    pub wraps: AtomicUsize,
    pub validated_reads: Arc<AtomicUsize>,
}

impl ValidationHook for CountingHook {
    fn wrap(&self, _schema: &str, inner: Arc<dyn Output>) -> Arc<dyn Output> {
        self.wraps.fetch_add(1, Ordering::SeqCst);
        Arc::new(CountingOutput {
            inner,
            reads: Arc::clone(&self.validated_reads),
        })
    }
}

struct CountingOutput {
    inner: Arc<dyn Output>,
    reads: Arc<AtomicUsize>,
}

impl Output for CountingOutput {
    fn processor_type(&self) -> &str {
        self.inner.processor_type()
    }

    fn port_name(&self) -> &str {
        self.inner.port_name()
    }

    fn read(&self, context: &Arc<ExecutionContext>, receiver: &mut dyn Receiver) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read(context, receiver)
    }

    fn key(&self, context: &Arc<ExecutionContext>) -> Option<CacheKey> {
        self.inner.key(context)
    }

    fn validity(&self, context: &Arc<ExecutionContext>) -> Option<Validity> {
        self.inner.validity(context)
    }
}

/// Collect the `Characters` runs delivered to a receiver as strings.
pub fn character_runs(events: &[Event]) -> Vec<&str> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::Characters(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}
