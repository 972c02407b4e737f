use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use rayon::prelude::*;

use crate::config::RegistrationConfig;
use crate::error::{RegistrationError, Result};
use crate::image::{ChannelSelection, Image};
use crate::transform::Transform;

use super::{FrameSetup, PreparedFrame, Registration};

/// Immutable analysis of one reference image.
#[derive(Debug)]
struct ReferenceSnapshot {
    frame: PreparedFrame,
    /// Targets are analysed with the same selection as the reference.
    selection: ChannelSelection,
}

#[derive(Debug, Default)]
struct ReferenceState {
    active: Option<Arc<ReferenceSnapshot>>,
    designated: HashMap<u32, Arc<ReferenceSnapshot>>,
}

/// Registers targets against a stored reference.
///
/// Every call takes a snapshot of the active reference before doing any
/// work, so replacing the reference never disturbs registrations already in
/// flight on other threads.
#[derive(Debug)]
pub struct FourierMellinWithReference {
    setup: Arc<FrameSetup>,
    state: RwLock<ReferenceState>,
}

impl FourierMellinWithReference {
    pub fn new(width: usize, height: usize) -> Result<Self> {
        Self::with_config(width, height, RegistrationConfig::default())
    }

    pub fn with_config(width: usize, height: usize, config: RegistrationConfig) -> Result<Self> {
        Ok(Self::from_setup(FrameSetup::new(width, height, config)?))
    }

    pub fn from_setup(setup: Arc<FrameSetup>) -> Self {
        Self {
            setup,
            state: RwLock::new(ReferenceState::default()),
        }
    }

    pub fn setup(&self) -> &Arc<FrameSetup> {
        &self.setup
    }

    /// Install `image` (reduced to luminance) as the active reference.
    pub fn set_reference(&self, image: &Image) -> Result<()> {
        self.set_reference_channel(image, ChannelSelection::Luminance)
    }

    /// Install one channel of `image`, or its luminance, as the active
    /// reference.
    pub fn set_reference_channel(&self, image: &Image, selection: ChannelSelection) -> Result<()> {
        let snapshot = self.snapshot_of(image, selection)?;
        self.state.write().active = Some(snapshot);
        tracing::debug!(?selection, "Reference set");
        Ok(())
    }

    /// Store a reference under `designation` and make it active.
    pub fn set_reference_with_designation(
        &self,
        image: &Image,
        selection: ChannelSelection,
        designation: u32,
    ) -> Result<()> {
        let snapshot = self.snapshot_of(image, selection)?;
        let mut state = self.state.write();
        state.designated.insert(designation, snapshot.clone());
        state.active = Some(snapshot);
        drop(state);

        tracing::debug!(designation, ?selection, "Designated reference set");
        Ok(())
    }

    /// Make a previously stored reference active.
    pub fn select_reference(&self, designation: u32) -> Result<()> {
        let mut state = self.state.write();
        match state.designated.get(&designation).cloned() {
            Some(snapshot) => {
                state.active = Some(snapshot);
                Ok(())
            }
            None => {
                tracing::warn!(designation, "No reference stored under designation");
                Err(RegistrationError::UnknownDesignation(designation))
            }
        }
    }

    /// Designations with a stored reference, ascending.
    pub fn designations(&self) -> Vec<u32> {
        let mut designations: Vec<u32> = self.state.read().designated.keys().copied().collect();
        designations.sort_unstable();
        designations
    }

    pub fn has_reference(&self) -> bool {
        self.state.read().active.is_some()
    }

    pub fn register(&self, target: &Image) -> Result<Registration> {
        let reference = self.active()?;
        self.register_against(&reference, target)
    }

    pub fn register_transform_only(&self, target: &Image) -> Result<Transform> {
        let reference = self.active()?;
        self.transform_against(&reference, target)
    }

    /// Register every image against the same reference snapshot.
    ///
    /// All sizes are checked before any work starts. Results keep the input
    /// order. An empty batch succeeds with no results.
    pub fn register_batch(&self, targets: &[Image]) -> Result<Vec<Registration>> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let reference = self.active()?;

        let expected = self.setup.size();
        if let Some((index, image)) = targets
            .iter()
            .enumerate()
            .find(|(_, image)| image.size() != expected)
        {
            return Err(RegistrationError::BatchShapeMismatch {
                index,
                expected,
                actual: image.size(),
            });
        }

        targets
            .par_iter()
            .map(|target| self.register_against(&reference, target))
            .collect()
    }

    /// See [`FrameSetup::get_transformed`].
    pub fn get_transformed(&self, image: &Image, transform: &Transform) -> Result<Image> {
        self.setup.get_transformed(image, transform)
    }

    fn snapshot_of(&self, image: &Image, selection: ChannelSelection) -> Result<Arc<ReferenceSnapshot>> {
        let frame = self.setup.prepare(image, selection)?;
        Ok(Arc::new(ReferenceSnapshot { frame, selection }))
    }

    /// Clone of the active snapshot; the lock is released on return.
    fn active(&self) -> Result<Arc<ReferenceSnapshot>> {
        self.state
            .read()
            .active
            .clone()
            .ok_or(RegistrationError::ReferenceNotSet)
    }

    fn transform_against(&self, reference: &ReferenceSnapshot, target: &Image) -> Result<Transform> {
        let target = self.setup.prepare(target, reference.selection)?;
        Ok(self.setup.register_prepared(&reference.frame, &target))
    }

    fn register_against(&self, reference: &ReferenceSnapshot, target: &Image) -> Result<Registration> {
        let transform = self.transform_against(reference, target)?;
        Ok(Registration {
            image: self.setup.align(target, &transform),
            transform,
        })
    }
}
