// src/session.rs

use crate::error::{InvoiceError, RenderError};
use crate::invoice::{Field, InvoiceState};
use crate::logo::{Logo, LogoSource};
use crate::render::export::{Saver, Viewer};
use crate::render::{self, DEFAULT_FILE_NAME, Layout, RenderedDocument, Snapshot};
use crate::totals::{self, ComputedTotals};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, channel};
use tracing::{debug, info, info_span, warn};

/// Whether a rendered document matches the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Editing,
    Prepared,
}

/// Values the UI layer displays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Readout {
    pub total_amount: f64,
    pub logo_url: Option<String>,
    pub is_document_ready: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Changed(Readout),
    Closed,
}

/// Owns the invoice being edited and drives prepare/view/download.
pub struct Session {
    state: InvoiceState,
    totals: ComputedTotals,
    document: Option<RenderedDocument>,
    layout: Layout,
    file_name: String,
    open: bool,
    subscribers: Vec<Sender<SessionEvent>>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Layout::default(), DEFAULT_FILE_NAME)
    }
}

impl Session {
    pub fn new(layout: Layout, file_name: impl Into<String>) -> Self {
        Self {
            state: InvoiceState::default(),
            totals: ComputedTotals::default(),
            document: None,
            layout,
            file_name: file_name.into(),
            open: true,
            subscribers: Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Readouts
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &InvoiceState {
        &self.state
    }

    pub fn totals(&self) -> ComputedTotals {
        self.totals
    }

    pub fn total_amount(&self) -> f64 {
        self.totals.total
    }

    pub fn logo_url(&self) -> Option<String> {
        self.state.logo.as_ref().map(Logo::data_url)
    }

    pub fn is_document_ready(&self) -> bool {
        self.document.is_some()
    }

    pub fn document(&self) -> Option<&RenderedDocument> {
        self.document.as_ref()
    }

    pub fn phase(&self) -> Phase {
        if self.document.is_some() {
            Phase::Prepared
        } else {
            Phase::Editing
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn readout(&self) -> Readout {
        Readout {
            total_amount: self.total_amount(),
            logo_url: self.logo_url(),
            is_document_ready: self.is_document_ready(),
        }
    }

    /// Receive a `Changed` event after every state change and `Closed`
    /// when the session ends. Dropped receivers are pruned.
    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    pub fn add_item(&mut self) -> usize {
        let index = self.state.add_item();
        debug!(index, "Item added");
        self.edited();
        index
    }

    pub fn remove_item(&mut self, index: usize) -> Result<(), InvoiceError> {
        let removed = self.state.remove_item(index)?;
        debug!(index, product = %removed.product, "Item removed");
        self.edited();
        Ok(())
    }

    pub fn update_field(&mut self, field: Field, value: &str) -> Result<(), InvoiceError> {
        if let Err(e) = self.state.update_field(field, value) {
            warn!(field = %field, error = %e, "Rejected field value");
            return Err(e);
        }
        debug!(field = %field, "Field updated");
        self.edited();
        Ok(())
    }

    pub fn set_discount(&mut self, value: &str) -> Result<(), InvoiceError> {
        self.update_field(Field::Discount, value)
    }

    pub fn set_payment_method(&mut self, value: &str) -> Result<(), InvoiceError> {
        self.update_field(Field::PaymentMethod, value)
    }

    pub fn set_logo(&mut self, bytes: Vec<u8>, mime: impl Into<String>) {
        let logo = Logo::new(bytes, mime);
        debug!(mime = %logo.mime, bytes = logo.bytes.len(), "Logo set");
        self.state.logo = Some(logo);
        self.edited();
    }

    /// Suspend on `source` once, then assign its result in one step.
    /// Returns whether a logo was picked.
    pub async fn request_logo_upload<S>(&mut self, source: &S) -> Result<bool, InvoiceError>
    where
        S: LogoSource + ?Sized,
    {
        match source.pick().await? {
            Some(logo) => {
                self.set_logo(logo.bytes, logo.mime);
                Ok(true)
            }
            None => {
                debug!("Logo upload cancelled");
                Ok(false)
            }
        }
    }

    /// Back to an empty form with no document. Idempotent.
    pub fn reset(&mut self) {
        self.state = InvoiceState::default();
        self.totals = ComputedTotals::default();
        self.document = None;
        info!("Session reset");
        self.notify(SessionEvent::Changed(self.readout()));
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    pub fn open(&mut self) {
        self.open = true;
        info!(items = self.state.items.len(), "Session opened");
    }

    /// Ends the session without touching the state.
    pub fn close(&mut self) {
        self.open = false;
        info!("Session closed");
        self.notify(SessionEvent::Closed);
    }

    // -----------------------------------------------------------------------
    // Document
    // -----------------------------------------------------------------------

    /// Validate the whole form and lay out a fresh document from it.
    pub fn prepare(&mut self) -> Result<&RenderedDocument, InvoiceError> {
        let span = info_span!("prepare", items = self.state.items.len());
        let _guard = span.enter();

        let errors = self.state.validate();
        if !errors.is_empty() {
            for e in &errors {
                warn!(error = %e, "Invoice not ready");
            }
            return Err(InvoiceError::Incomplete(errors));
        }

        let snapshot = Snapshot::of(&self.state);
        let doc = render::render(&snapshot, &self.layout);
        info!(
            total = snapshot.totals.total,
            fingerprint = %doc.fingerprint(),
            "Document prepared"
        );
        let readout = Readout {
            total_amount: snapshot.totals.total,
            logo_url: self.logo_url(),
            is_document_ready: true,
        };
        self.notify(SessionEvent::Changed(readout));
        Ok(&*self.document.insert(doc))
    }

    /// No-op when nothing has been prepared.
    pub fn view<V>(&self, viewer: &V) -> Result<(), RenderError>
    where
        V: Viewer + ?Sized,
    {
        let Some(doc) = &self.document else {
            debug!("View requested without a prepared document");
            return Ok(());
        };
        viewer.show(doc)
    }

    /// Save the document, then reset and close. No-op (returns `None`)
    /// when nothing has been prepared. A failed save keeps everything.
    pub fn download<S>(&mut self, saver: &S) -> Result<Option<PathBuf>, RenderError>
    where
        S: Saver + ?Sized,
    {
        let Some(doc) = &self.document else {
            debug!("Download requested without a prepared document");
            return Ok(None);
        };

        let span = info_span!("download", file = %self.file_name);
        let _guard = span.enter();

        let path = saver.save(doc, &self.file_name)?;
        self.reset();
        self.close();
        Ok(Some(path))
    }

    fn edited(&mut self) {
        self.totals = totals::compute_totals(&self.state.items, self.state.discount_percent);
        if self.document.take().is_some() {
            debug!("Prepared document discarded after edit");
        }
        self.notify(SessionEvent::Changed(self.readout()));
    }

    fn notify(&mut self, event: SessionEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }
}
