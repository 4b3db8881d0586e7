/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */
//! EFX effects.
//!
//! [Effect] is the untyped handle shared by all effect types. Each type has a
//! newtype in a submodule with accessors for its parameters, and [AnyEffect]
//! holds whichever one [crate::System::create_effect] made.
//!
//! An effect's parameters are copied into an [crate::EffectSlot] when it is
//! attached, so changes made afterwards only take effect once it is attached
//! again.

mod autowah;
mod chorus;
mod compressor;
mod distortion;
mod echo;
mod equalizer;
mod flanger;
mod frequency_shifter;
mod pitch_shifter;
mod reverb;
mod ring_modulator;
mod vocal_morpher;

pub use autowah::Autowah;
pub use chorus::{Chorus, Waveform};
pub use compressor::Compressor;
pub use distortion::Distortion;
pub use echo::Echo;
pub use equalizer::Equalizer;
pub use flanger::Flanger;
pub use frequency_shifter::{FrequencyShifter, ShiftDirection};
pub use pitch_shifter::PitchShifter;
pub use reverb::Reverb;
pub use ring_modulator::{RingModulator, RingModulatorWaveform};
pub use vocal_morpher::{Phoneme, VocalMorpher, VocalMorpherWaveform};

use crate::audio::openal::*;
use crate::error::SoundError;
use crate::object::{Destroy, ObjectHandle, ObjectKind, Registry};
use crate::param::{FloatParam, IntParam, ParamValues};
use std::fmt;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectType {
    Autowah,
    Chorus,
    Compressor,
    Distortion,
    Echo,
    Equalizer,
    Flanger,
    FrequencyShifter,
    PitchShifter,
    Reverb,
    RingModulator,
    VocalMorpher,
}

impl EffectType {
    pub const ALL: [EffectType; 12] = [
        EffectType::Autowah,
        EffectType::Chorus,
        EffectType::Compressor,
        EffectType::Distortion,
        EffectType::Echo,
        EffectType::Equalizer,
        EffectType::Flanger,
        EffectType::FrequencyShifter,
        EffectType::PitchShifter,
        EffectType::Reverb,
        EffectType::RingModulator,
        EffectType::VocalMorpher,
    ];

    /// The `AL_EFFECT_*` value.
    pub fn al_value(self) -> ALint {
        match self {
            EffectType::Autowah => AL_EFFECT_AUTOWAH,
            EffectType::Chorus => AL_EFFECT_CHORUS,
            EffectType::Compressor => AL_EFFECT_COMPRESSOR,
            EffectType::Distortion => AL_EFFECT_DISTORTION,
            EffectType::Echo => AL_EFFECT_ECHO,
            EffectType::Equalizer => AL_EFFECT_EQUALIZER,
            EffectType::Flanger => AL_EFFECT_FLANGER,
            EffectType::FrequencyShifter => AL_EFFECT_FREQUENCY_SHIFTER,
            EffectType::PitchShifter => AL_EFFECT_PITCH_SHIFTER,
            EffectType::Reverb => AL_EFFECT_REVERB,
            EffectType::RingModulator => AL_EFFECT_RING_MODULATOR,
            EffectType::VocalMorpher => AL_EFFECT_VOCAL_MORPHER,
        }
    }

    pub fn from_name(name: &str) -> Option<EffectType> {
        EffectType::ALL
            .into_iter()
            .find(|effect_type| effect_type.name().eq_ignore_ascii_case(name))
    }

    pub fn name(self) -> &'static str {
        match self {
            EffectType::Autowah => "autowah",
            EffectType::Chorus => "chorus",
            EffectType::Compressor => "compressor",
            EffectType::Distortion => "distortion",
            EffectType::Echo => "echo",
            EffectType::Equalizer => "equalizer",
            EffectType::Flanger => "flanger",
            EffectType::FrequencyShifter => "frequency-shifter",
            EffectType::PitchShifter => "pitch-shifter",
            EffectType::Reverb => "reverb",
            EffectType::RingModulator => "ring-modulator",
            EffectType::VocalMorpher => "vocal-morpher",
        }
    }

    fn float_params(self) -> &'static [FloatParam] {
        match self {
            EffectType::Autowah => autowah::FLOAT_PARAMS,
            EffectType::Chorus => chorus::FLOAT_PARAMS,
            EffectType::Compressor => &[],
            EffectType::Distortion => distortion::FLOAT_PARAMS,
            EffectType::Echo => echo::FLOAT_PARAMS,
            EffectType::Equalizer => equalizer::FLOAT_PARAMS,
            EffectType::Flanger => flanger::FLOAT_PARAMS,
            EffectType::FrequencyShifter => frequency_shifter::FLOAT_PARAMS,
            EffectType::PitchShifter => &[],
            EffectType::Reverb => reverb::FLOAT_PARAMS,
            EffectType::RingModulator => ring_modulator::FLOAT_PARAMS,
            EffectType::VocalMorpher => vocal_morpher::FLOAT_PARAMS,
        }
    }

    fn int_params(self) -> &'static [IntParam] {
        match self {
            EffectType::Autowah => &[],
            EffectType::Chorus => chorus::INT_PARAMS,
            EffectType::Compressor => compressor::INT_PARAMS,
            EffectType::Distortion => &[],
            EffectType::Echo => &[],
            EffectType::Equalizer => &[],
            EffectType::Flanger => flanger::INT_PARAMS,
            EffectType::FrequencyShifter => frequency_shifter::INT_PARAMS,
            EffectType::PitchShifter => pitch_shifter::INT_PARAMS,
            EffectType::Reverb => reverb::INT_PARAMS,
            EffectType::RingModulator => ring_modulator::INT_PARAMS,
            EffectType::VocalMorpher => vocal_morpher::INT_PARAMS,
        }
    }
}

impl fmt::Display for EffectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Handle to an EFX effect object. Clones refer to the same effect.
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

struct EffectInner {
    handle: ObjectHandle,
    effect_type: EffectType,
    values: ParamValues,
}

impl Destroy for EffectInner {
    fn destroy(&self) -> Result<(), SoundError> {
        self.handle
            .release(|api, id| {
                if let Ok(efx) = api.efx() {
                    unsafe { (efx.alDeleteEffects)(1, &id) };
                }
            })
            .map(|_| ())
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        if let Err(err) = self.destroy() {
            log!("Couldn't free effect {}: {}", self.handle.id(), err);
        }
    }
}

impl Effect {
    /// Allocate an effect, set its type, and apply the EFX default for every
    /// parameter.
    pub(crate) fn new(
        api: &Arc<Api>,
        registry: &Arc<Registry>,
        effect_type: EffectType,
    ) -> Result<Effect, SoundError> {
        let handle = ObjectHandle::allocate(api, registry, ObjectKind::Effect, |api| {
            let efx = api.efx()?;
            let mut id = 0;
            unsafe { (efx.alGenEffects)(1, &mut id) };
            Ok(id)
        })?;
        let inner = Arc::new(EffectInner {
            handle,
            effect_type,
            values: ParamValues::default(),
        });
        let weak: Weak<dyn Destroy> = Arc::downgrade(&inner) as _;
        inner.handle.register(weak);

        let effect = Effect { inner };
        let al_type = effect_type.al_value();
        effect
            .inner
            .handle
            .call_efx(|efx, id| unsafe { (efx.alEffecti)(id, AL_EFFECT_TYPE, al_type) })?;
        for param in effect_type.float_params() {
            effect.set_float(param, param.default)?;
        }
        for param in effect_type.int_params() {
            effect.set_int(param, param.default)?;
        }
        Ok(effect)
    }

    pub fn id(&self) -> ALuint {
        self.inner.handle.id()
    }

    pub fn effect_type(&self) -> EffectType {
        self.inner.effect_type
    }

    pub fn is_allocated(&self) -> bool {
        self.inner.handle.is_allocated()
    }

    /// Free the native effect. Does nothing if it was already freed.
    pub fn destroy(&self) -> Result<(), SoundError> {
        self.inner.destroy()
    }

    pub(crate) fn float(&self, param: &FloatParam) -> f32 {
        self.inner.values.float(param)
    }

    pub(crate) fn set_float(&self, param: &FloatParam, value: f32) -> Result<(), SoundError> {
        let value = param.clamp(value);
        self.inner
            .handle
            .call_efx(|efx, id| unsafe { (efx.alEffectf)(id, param.param, value) })?;
        self.inner.values.set_float(param, value);
        Ok(())
    }

    pub(crate) fn int(&self, param: &IntParam) -> ALint {
        self.inner.values.int(param)
    }

    pub(crate) fn set_int(&self, param: &IntParam, value: ALint) -> Result<(), SoundError> {
        let value = param.clamp(value);
        self.inner
            .handle
            .call_efx(|efx, id| unsafe { (efx.alEffecti)(id, param.param, value) })?;
        self.inner.values.set_int(param, value);
        Ok(())
    }

    pub(crate) fn bool(&self, param: &IntParam) -> bool {
        self.int(param) != 0
    }

    pub(crate) fn set_bool(&self, param: &IntParam, value: bool) -> Result<(), SoundError> {
        self.set_int(param, value as ALint)
    }
}

impl PartialEq for Effect {
    fn eq(&self, other: &Effect) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Effect {}

impl fmt::Debug for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.id())
            .field("type", &self.effect_type())
            .finish()
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Effect {} {}", self.id(), self.effect_type())
    }
}

/// Implements the conversions every typed effect newtype has.
macro_rules! typed_effect {
    ($name:ident) => {
        impl AsRef<$crate::effect::Effect> for $name {
            fn as_ref(&self) -> &$crate::effect::Effect {
                &self.0
            }
        }

        impl From<$name> for $crate::effect::Effect {
            fn from(effect: $name) -> $crate::effect::Effect {
                effect.0
            }
        }

        impl $name {
            pub(crate) fn from_effect(effect: $crate::effect::Effect) -> $name {
                $name(effect)
            }
        }
    };
}
pub(crate) use typed_effect;

/// An effect of any type.
#[derive(Debug, Clone)]
pub enum AnyEffect {
    Autowah(Autowah),
    Chorus(Chorus),
    Compressor(Compressor),
    Distortion(Distortion),
    Echo(Echo),
    Equalizer(Equalizer),
    Flanger(Flanger),
    FrequencyShifter(FrequencyShifter),
    PitchShifter(PitchShifter),
    Reverb(Reverb),
    RingModulator(RingModulator),
    VocalMorpher(VocalMorpher),
}

impl AnyEffect {
    pub(crate) fn from_effect(effect: Effect) -> AnyEffect {
        match effect.effect_type() {
            EffectType::Autowah => AnyEffect::Autowah(Autowah::from_effect(effect)),
            EffectType::Chorus => AnyEffect::Chorus(Chorus::from_effect(effect)),
            EffectType::Compressor => AnyEffect::Compressor(Compressor::from_effect(effect)),
            EffectType::Distortion => AnyEffect::Distortion(Distortion::from_effect(effect)),
            EffectType::Echo => AnyEffect::Echo(Echo::from_effect(effect)),
            EffectType::Equalizer => AnyEffect::Equalizer(Equalizer::from_effect(effect)),
            EffectType::Flanger => AnyEffect::Flanger(Flanger::from_effect(effect)),
            EffectType::FrequencyShifter => {
                AnyEffect::FrequencyShifter(FrequencyShifter::from_effect(effect))
            }
            EffectType::PitchShifter => AnyEffect::PitchShifter(PitchShifter::from_effect(effect)),
            EffectType::Reverb => AnyEffect::Reverb(Reverb::from_effect(effect)),
            EffectType::RingModulator => {
                AnyEffect::RingModulator(RingModulator::from_effect(effect))
            }
            EffectType::VocalMorpher => AnyEffect::VocalMorpher(VocalMorpher::from_effect(effect)),
        }
    }

    pub fn effect_type(&self) -> EffectType {
        self.as_ref().effect_type()
    }
}

impl AsRef<Effect> for AnyEffect {
    fn as_ref(&self) -> &Effect {
        match self {
            AnyEffect::Autowah(effect) => effect.as_ref(),
            AnyEffect::Chorus(effect) => effect.as_ref(),
            AnyEffect::Compressor(effect) => effect.as_ref(),
            AnyEffect::Distortion(effect) => effect.as_ref(),
            AnyEffect::Echo(effect) => effect.as_ref(),
            AnyEffect::Equalizer(effect) => effect.as_ref(),
            AnyEffect::Flanger(effect) => effect.as_ref(),
            AnyEffect::FrequencyShifter(effect) => effect.as_ref(),
            AnyEffect::PitchShifter(effect) => effect.as_ref(),
            AnyEffect::Reverb(effect) => effect.as_ref(),
            AnyEffect::RingModulator(effect) => effect.as_ref(),
            AnyEffect::VocalMorpher(effect) => effect.as_ref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn creation_sets_type_and_defaults() {
        let system = testing::system();
        let effect = system.create_effect(EffectType::Echo).unwrap();
        let AnyEffect::Echo(echo) = &effect else {
            panic!("{:?}", effect);
        };
        let id = echo.as_ref().id();
        assert_eq!(
            testing::int(ObjectKind::Effect, id, AL_EFFECT_TYPE),
            Some(AL_EFFECT_ECHO)
        );
        assert_eq!(
            testing::float(ObjectKind::Effect, id, AL_ECHO_SPREAD),
            Some(-1.0)
        );
        assert_eq!(echo.spread(), -1.0);
    }

    #[test]
    fn every_type_can_be_created() {
        let system = testing::system();
        for effect_type in EffectType::ALL {
            let effect = system.create_effect(effect_type).unwrap();
            assert_eq!(effect.effect_type(), effect_type);
            assert_eq!(
                testing::int(ObjectKind::Effect, effect.as_ref().id(), AL_EFFECT_TYPE),
                Some(effect_type.al_value())
            );
        }
    }

    #[test]
    fn creation_applies_every_default() {
        let system = testing::system();
        // Parameter counts of each effect in EFX.
        let counts = [
            (EffectType::Autowah, 4),
            (EffectType::Chorus, 6),
            (EffectType::Compressor, 1),
            (EffectType::Distortion, 5),
            (EffectType::Echo, 5),
            (EffectType::Equalizer, 10),
            (EffectType::Flanger, 6),
            (EffectType::FrequencyShifter, 3),
            (EffectType::PitchShifter, 2),
            (EffectType::Reverb, 13),
            (EffectType::RingModulator, 3),
            (EffectType::VocalMorpher, 6),
        ];
        assert_eq!(counts.len(), EffectType::ALL.len());

        for (effect_type, count) in counts {
            let effect = system.create_effect(effect_type).unwrap();
            let effect = effect.as_ref();
            let floats = effect_type.float_params();
            let ints = effect_type.int_params();
            assert_eq!(floats.len() + ints.len(), count, "{}", effect_type);

            for param in floats {
                assert!(
                    (param.min..=param.max).contains(&param.default),
                    "{} {:#x}",
                    effect_type,
                    param.param
                );
                assert_eq!(
                    testing::float(ObjectKind::Effect, effect.id(), param.param),
                    Some(param.default),
                    "{} {:#x}",
                    effect_type,
                    param.param
                );
                assert_eq!(effect.float(param), param.default);
            }
            for param in ints {
                assert!(
                    (param.min..=param.max).contains(&param.default),
                    "{} {:#x}",
                    effect_type,
                    param.param
                );
                assert_eq!(
                    testing::int(ObjectKind::Effect, effect.id(), param.param),
                    Some(param.default),
                    "{} {:#x}",
                    effect_type,
                    param.param
                );
                assert_eq!(effect.int(param), param.default);
            }
        }
    }

    #[test]
    fn defaults_match_efx() {
        let system = testing::system();
        let expected_floats = [
            (EffectType::Autowah, AL_AUTOWAH_ATTACK_TIME, 0.06),
            (EffectType::Equalizer, AL_EQUALIZER_LOW_CUTOFF, 200.0),
            (EffectType::Flanger, AL_FLANGER_DELAY, 0.002),
            (EffectType::Reverb, AL_REVERB_DECAY_TIME, 1.49),
            (EffectType::RingModulator, AL_RING_MODULATOR_FREQUENCY, 440.0),
        ];
        for (effect_type, param, value) in expected_floats {
            let effect = system.create_effect(effect_type).unwrap();
            assert_eq!(
                testing::float(ObjectKind::Effect, effect.as_ref().id(), param),
                Some(value),
                "{}",
                effect_type
            );
        }
        let expected_ints = [
            (EffectType::Chorus, AL_CHORUS_WAVEFORM, 1),
            (EffectType::Compressor, AL_COMPRESSOR_ONOFF, 1),
            (EffectType::PitchShifter, AL_PITCH_SHIFTER_COARSE_TUNE, 12),
            (EffectType::VocalMorpher, AL_VOCAL_MORPHER_PHONEMEB, 10),
        ];
        for (effect_type, param, value) in expected_ints {
            let effect = system.create_effect(effect_type).unwrap();
            assert_eq!(
                testing::int(ObjectKind::Effect, effect.as_ref().id(), param),
                Some(value),
                "{}",
                effect_type
            );
        }
    }

    #[test]
    fn destroy_is_idempotent() {
        let system = testing::system();
        let effect = system.create_reverb().unwrap();
        let id = effect.as_ref().id();
        effect.as_ref().destroy().unwrap();
        assert!(!testing::is_live(ObjectKind::Effect, id));
        effect.as_ref().destroy().unwrap();
        assert!(matches!(
            effect.set_density(0.5),
            Err(SoundError::Destroyed(ObjectKind::Effect))
        ));
    }

    #[test]
    fn names_round_trip() {
        for effect_type in EffectType::ALL {
            assert_eq!(EffectType::from_name(effect_type.name()), Some(effect_type));
        }
        assert_eq!(EffectType::from_name("Reverb"), Some(EffectType::Reverb));
        assert_eq!(EffectType::from_name("phaser"), None);
    }
}
