use std::collections::HashMap;

use serde::{ser::SerializeMap, Serialize, Serializer};

/// Одна пара ключ/значение.
#[cfg_attr(feature = "fuzz", derive(arbitrary::Arbitrary))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

/// Упорядоченный набор тегов записи.
///
/// Порядок вставки сохраняется. Повторная вставка ключа заменяет значение
/// на месте первого вхождения, поэтому ключи в наборе уникальны.
#[derive(Debug, Clone, Default)]
pub struct Tags {
    entries: Vec<Tag>,
    /// Ключ -> позиция в `entries`.
    index: HashMap<String, usize>,
}

////////////////////////////////////////////////////////////////////////////////
// Собственные методы
////////////////////////////////////////////////////////////////////////////////

impl Tags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            index: HashMap::with_capacity(capacity),
        }
    }

    /// Вставляет тег. Если ключ уже есть, заменяет значение и возвращает
    /// старое.
    pub fn insert(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Option<String> {
        let key = key.into();
        let value = value.into();
        if let Some(&pos) = self.index.get(&key) {
            return Some(std::mem::replace(&mut self.entries[pos].value, value));
        }
        self.index.insert(key.clone(), self.entries.len());
        self.entries.push(Tag { key, value });
        None
    }

    pub fn get(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.index
            .get(key)
            .map(|&pos| self.entries[pos].value.as_str())
    }

    pub fn contains_key(
        &self,
        key: &str,
    ) -> bool {
        self.index.contains_key(key)
    }

    /// Удаляет тег, сохраняя порядок остальных.
    pub fn remove(
        &mut self,
        key: &str,
    ) -> Option<String> {
        let pos = self.index.remove(key)?;
        let removed = self.entries.remove(pos);
        for tag in &self.entries[pos..] {
            if let Some(i) = self.index.get_mut(&tag.key) {
                *i -= 1;
            }
        }
        Some(removed.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tag> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

////////////////////////////////////////////////////////////////////////////////
// Общие реализации трейтов для Tags
////////////////////////////////////////////////////////////////////////////////

/// Равенство по списку тегов с учётом порядка.
impl PartialEq for Tags {
    fn eq(
        &self,
        other: &Self,
    ) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Tags {}

#[cfg(feature = "fuzz")]
impl<'a> arbitrary::Arbitrary<'a> for Tags {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let pairs: Vec<(String, String)> = u.arbitrary()?;
        Ok(pairs.into_iter().collect())
    }
}

impl<K, V> FromIterator<(K, V)> for Tags
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut tags = Tags::new();
        for (k, v) in iter {
            tags.insert(k, v);
        }
        tags
    }
}

impl<K, V> Extend<(K, V)> for Tags
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(
        &mut self,
        iter: I,
    ) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a Tag;
    type IntoIter = std::slice::Iter<'a, Tag>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(
        &self,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for tag in &self.entries {
            map.serialize_entry(&tag.key, &tag.value)?;
        }
        map.end()
    }
}

////////////////////////////////////////////////////////////////////////////////
// Тесты
////////////////////////////////////////////////////////////////////////////////
