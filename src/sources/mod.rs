//! The layered configuration store that discovered properties are merged into.
//!
//! Layers are kept in precedence order: the first layer holding a key
//! provides its effective value.

use crate::properties::PropertyMap;

/// A named set of properties contributed to the overall configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PropertyLayer {
	name: String,
	map: PropertyMap,
}

impl PropertyLayer {
	/// Create a layer holding exactly the given properties.
	pub fn new(name: impl Into<String>, map: PropertyMap) -> Self {
		PropertyLayer {
			name: name.into(),
			map,
		}
	}

	pub fn name(&self) -> &str {
		&self.name
	}

	pub fn map(&self) -> &PropertyMap {
		&self.map
	}

	/// Mutable access to the layer's properties, used to merge later loads.
	pub fn map_mut(&mut self) -> &mut PropertyMap {
		&mut self.map
	}

	pub fn get(&self, key: &str) -> Option<&str> {
		self.map.get(key).map(String::as_str)
	}
}

/// Ordered collection of property layers, highest precedence first.
///
/// At most one layer exists per name; adding a layer whose name is already
/// present replaces the old one.
#[derive(Debug, Clone, Default)]
pub struct PropertySources {
	layers: Vec<PropertyLayer>,
}

impl PropertySources {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn get(&self, name: &str) -> Option<&PropertyLayer> {
		self.layers.iter().find(|layer| layer.name == name)
	}

	pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyLayer> {
		self.layers.iter_mut().find(|layer| layer.name == name)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.get(name).is_some()
	}

	/// Add a layer with the highest precedence.
	pub fn add_first(&mut self, layer: PropertyLayer) {
		self.remove(&layer.name);
		self.layers.insert(0, layer);
	}

	/// Add a layer with the lowest precedence.
	pub fn add_last(&mut self, layer: PropertyLayer) {
		self.remove(&layer.name);
		self.layers.push(layer);
	}

	pub fn remove(&mut self, name: &str) -> Option<PropertyLayer> {
		let index = self.layers.iter().position(|layer| layer.name == name)?;
		Some(self.layers.remove(index))
	}

	/// Iterate layers in precedence order.
	pub fn iter(&self) -> impl Iterator<Item = &PropertyLayer> {
		self.layers.iter()
	}

	pub fn len(&self) -> usize {
		self.layers.len()
	}

	pub fn is_empty(&self) -> bool {
		self.layers.is_empty()
	}

	/// Resolve the effective value of a key across all layers.
	pub fn get_property(&self, key: &str) -> Option<&str> {
		self.layers.iter().find_map(|layer| layer.get(key))
	}

	/// All distinct property names, sorted.
	pub fn property_names(&self) -> Vec<&str> {
		let mut names: Vec<&str> = self
			.layers
			.iter()
			.flat_map(|layer| layer.map.keys().map(String::as_str))
			.collect();
		names.sort_unstable();
		names.dedup();
		names
	}
}
