// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Algorithm registries
//!
//! Name-to-constructor tables for energy algorithms and seam
//! strategies.  What is in the tables is decided at build time by
//! cargo features: an algorithm left out of the build is simply never
//! registered, and asking for it by name is a configuration error.
//! Nothing ever falls back to a different algorithm.

use crate::energymap::{Algorithm, EnergyMap, EnergyMapOptions};
use crate::error::{Result, SeamError};
use crate::flipper::Axis;
use crate::generator::{GeneratorOptions, SeamBatcher};
use image::{GrayImage, RgbaImage};
use std::collections::HashMap;

pub type EnergyMapConstructor = fn(&EnergyMapOptions) -> Algorithm;
pub type GeneratorConstructor = fn(&GeneratorOptions) -> Box<dyn SeamBatcher>;

/// Used when an options struct names no energy algorithm.
pub const DEFAULT_ALGORITHM: &str = "sobel";
/// Used when an options struct names no strategy.
pub const DEFAULT_GENERATOR: &str = "random";

pub struct AlgorithmRegistry<C: Copy> {
    entries: HashMap<&'static str, C>,
}

impl<C: Copy> Default for AlgorithmRegistry<C> {
    fn default() -> Self {
        AlgorithmRegistry {
            entries: HashMap::new(),
        }
    }
}

impl<C: Copy> AlgorithmRegistry<C> {
    pub fn new() -> Self {
        AlgorithmRegistry::default()
    }

    /// Record a constructor, replacing any earlier one of that name.
    pub fn register(&mut self, name: &'static str, constructor: C) {
        self.entries.insert(name, constructor);
    }

    pub fn get(&self, name: &str) -> Option<C> {
        self.entries.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.entries.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[derive(Default)]
pub struct Registries {
    pub energy_maps: AlgorithmRegistry<EnergyMapConstructor>,
    pub generators: AlgorithmRegistry<GeneratorConstructor>,
}

impl Registries {
    /// Tables with every algorithm this build was compiled with.
    pub fn register_all() -> Self {
        let mut registries = Registries::default();

        registries
            .energy_maps
            .register("sobel", Algorithm::sobel as EnergyMapConstructor);
        #[cfg(feature = "dual")]
        registries
            .energy_maps
            .register("dual", Algorithm::dual as EnergyMapConstructor);
        #[cfg(feature = "boundary-aware")]
        registries
            .energy_maps
            .register("boundary-aware", Algorithm::boundary_aware as EnergyMapConstructor);

        #[cfg(feature = "random-generator")]
        registries.generators.register(
            "random",
            crate::random::RandomBatcher::create as GeneratorConstructor,
        );
        #[cfg(feature = "predictive-generator")]
        registries.generators.register(
            "predictive",
            crate::predictive::PredictiveBatcher::create as GeneratorConstructor,
        );
        #[cfg(feature = "full-generator")]
        registries.generators.register(
            "full",
            crate::full::FullBatcher::create as GeneratorConstructor,
        );

        registries
    }

    /// The energy algorithm `options` asks for.
    pub fn algorithm(&self, options: &EnergyMapOptions) -> Result<Algorithm> {
        let name = cq!(options.algorithm.is_empty(), DEFAULT_ALGORITHM, options.algorithm.as_str());
        self.energy_maps
            .get(name)
            .map(|construct| construct(options))
            .ok_or_else(|| SeamError::UnknownAlgorithm(name.to_string()))
    }

    /// A fresh instance of the strategy `options` asks for.
    pub fn generator(&self, options: &GeneratorOptions) -> Result<Box<dyn SeamBatcher>> {
        let name = cq!(options.generator.is_empty(), DEFAULT_GENERATOR, options.generator.as_str());
        self.generators
            .get(name)
            .map(|construct| construct(options))
            .ok_or_else(|| SeamError::UnknownGenerator(name.to_string()))
    }

    /// Look up and build an energy map in one step.
    pub fn create_energy_map(
        &self,
        image: &RgbaImage,
        mask: Option<&GrayImage>,
        axis: Axis,
        options: &EnergyMapOptions,
    ) -> Result<EnergyMap> {
        EnergyMap::new(image, mask, axis, self.algorithm(options)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn unknown_names_are_configuration_errors() {
        let registries = Registries::register_all();
        let options = EnergyMapOptions {
            algorithm: "nonexistent".to_string(),
            ..EnergyMapOptions::default()
        };
        let err = registries.algorithm(&options).unwrap_err();
        assert_eq!(err, SeamError::UnknownAlgorithm("nonexistent".to_string()));
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("nonexistent"));

        let options = GeneratorOptions {
            generator: "cached".to_string(),
            ..GeneratorOptions::default()
        };
        let err = registries.generator(&options).err().unwrap();
        assert_eq!(err, SeamError::UnknownGenerator("cached".to_string()));
    }

    #[test]
    fn empty_registries_know_nothing() {
        let registries = Registries::default();
        assert!(registries.algorithm(&EnergyMapOptions::default()).is_err());
        assert!(registries.generator(&GeneratorOptions::default()).is_err());
    }

    #[test]
    fn blank_names_mean_the_defaults() {
        let registries = Registries::register_all();
        let options = EnergyMapOptions {
            algorithm: String::new(),
            ..EnergyMapOptions::default()
        };
        assert_eq!(registries.algorithm(&options).unwrap(), Algorithm::Sobel);
        assert!(registries.energy_maps.names().contains(&"sobel"));
    }

    #[cfg(all(feature = "dual", feature = "predictive-generator"))]
    #[test]
    fn builtins_are_registered() {
        let registries = Registries::register_all();
        assert!(registries.energy_maps.contains("dual"));
        let options = GeneratorOptions {
            generator: "predictive".to_string(),
            ..GeneratorOptions::default()
        };
        assert_eq!(registries.generator(&options).unwrap().name(), "predictive");
    }
}
