use sonobuoy_plugin::PluginDefinition;

use crate::Error;

/// Plugins in output order, unique by name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PluginSet {
    plugins: Vec<PluginDefinition>,
}

impl PluginSet {
    /// Appends `plugin`, rejecting empty and already-present names.
    pub fn insert(&mut self, plugin: PluginDefinition) -> Result<(), Error> {
        if plugin.name().is_empty() {
            return Err(Error::EmptyPluginName);
        }
        if self.contains(plugin.name()) {
            return Err(Error::DuplicatePluginName {
                name: plugin.name().to_string(),
            });
        }
        self.plugins.push(plugin);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.plugins.iter().any(|p| p.name() == name)
    }

    pub fn get(&self, name: &str) -> Option<&PluginDefinition> {
        self.plugins.iter().find(|p| p.name() == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PluginDefinition> {
        self.plugins.iter_mut().find(|p| p.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.iter().map(PluginDefinition::name).collect()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PluginDefinition> {
        self.plugins.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, PluginDefinition> {
        self.plugins.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl<'a> IntoIterator for &'a PluginSet {
    type Item = &'a PluginDefinition;
    type IntoIter = std::slice::Iter<'a, PluginDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
