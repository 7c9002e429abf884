//! The externally supplied list of valid feature classes and subclasses.

/// Geometry types given to classes that do not declare their own.
pub const DEFAULT_GEOMETRY_TYPES: [&str; 3] = ["points", "lines", "polygons"];

/// Read access to a classification.
pub trait Classification {
    /// Class names in classification order.
    fn class_names(&self) -> Vec<&str>;

    /// Look up a class by exact name.
    fn class(&self, name: &str) -> Option<&ClassificationClass>;

    /// Whether a class with this name exists.
    fn has_class(&self, name: &str) -> bool {
        self.class(name).is_some()
    }
}

/// One feature class with its valid subclasses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassificationClass {
    /// Class name.
    pub name: String,
    /// Valid subclass names in classification order.
    pub subclass_names: Vec<String>,
    /// Geometry suffixes for extended class names, if any.
    pub geometry_types: Option<Vec<String>>,
}

impl ClassificationClass {
    /// Create a class without subclasses or geometry types.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subclass_names: Vec::new(),
            geometry_types: None,
        }
    }

    /// Add a subclass name unless already present.
    pub fn add_subclass(&mut self, name: impl Into<String>) {
        let name = name.into();
        if !self.has_subclass(&name) {
            self.subclass_names.push(name);
        }
    }

    /// Whether `name` is a subclass of this class.
    pub fn has_subclass(&self, name: &str) -> bool {
        self.subclass_names.iter().any(|s| s == name)
    }

    /// `<name>_<geometry>` for each geometry type, or just the name.
    pub fn extended_class_names(&self) -> Vec<String> {
        match &self.geometry_types {
            Some(types) if !types.is_empty() => types
                .iter()
                .map(|geometry| format!("{}_{geometry}", self.name))
                .collect(),
            _ => vec![self.name.clone()],
        }
    }
}

/// A classification held in memory, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryClassification {
    classes: Vec<ClassificationClass>,
    geometry_types: Vec<String>,
}

impl Default for InMemoryClassification {
    fn default() -> Self {
        Self {
            classes: Vec::new(),
            geometry_types: DEFAULT_GEOMETRY_TYPES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl InMemoryClassification {
    /// Create an empty classification with the default geometry types.
    pub fn new() -> Self {
        Self::default()
    }

    /// Geometry types stamped onto classes added from now on.
    pub fn with_geometry_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.geometry_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Get the class named `name`, adding it first when missing.
    pub fn add_class_if_absent(&mut self, name: &str) -> &mut ClassificationClass {
        let index = match self.classes.iter().position(|c| c.name == name) {
            Some(index) => index,
            None => {
                let mut class = ClassificationClass::new(name);
                class.geometry_types = Some(self.geometry_types.clone());
                self.classes.push(class);
                self.classes.len() - 1
            }
        };
        &mut self.classes[index]
    }

    /// Add a class with its subclasses, builder style.
    pub fn with_class<I, S>(mut self, name: &str, subclasses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let class = self.add_class_if_absent(name);
        for subclass in subclasses {
            class.add_subclass(subclass);
        }
        self
    }

    /// All classes.
    pub fn classes(&self) -> &[ClassificationClass] {
        &self.classes
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether there are no classes.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl Classification for InMemoryClassification {
    fn class_names(&self) -> Vec<&str> {
        self.classes.iter().map(|c| c.name.as_str()).collect()
    }

    fn class(&self, name: &str) -> Option<&ClassificationClass> {
        self.classes.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facet_testhelpers::test;

    #[test]
    fn test_add_class_if_absent() {
        let mut classification = InMemoryClassification::new();
        classification.add_class_if_absent("aeroway").add_subclass("aerodrome");
        classification.add_class_if_absent("aeroway").add_subclass("aerodrome");
        classification.add_class_if_absent("aeroway").add_subclass("helipad");
        assert_eq!(classification.len(), 1);
        let class = classification.class("aeroway").unwrap();
        assert_eq!(class.subclass_names, vec!["aerodrome", "helipad"]);
        assert!(class.has_subclass("helipad"));
        assert!(!classification.has_class("Aeroway"));
    }

    #[test]
    fn test_extended_class_names() {
        let classification = InMemoryClassification::new().with_class("highway", ["primary"]);
        assert_eq!(
            classification.class("highway").unwrap().extended_class_names(),
            vec!["highway_points", "highway_lines", "highway_polygons"]
        );
        assert_eq!(
            ClassificationClass::new("plain").extended_class_names(),
            vec!["plain"]
        );
    }

    #[test]
    fn test_class_names_keep_insertion_order() {
        let classification = InMemoryClassification::new()
            .with_geometry_types(["lines"])
            .with_class("waterway", ["river"])
            .with_class("aeroway", ["aerodrome"]);
        assert_eq!(classification.class_names(), vec!["waterway", "aeroway"]);
        assert_eq!(
            classification.class("aeroway").unwrap().extended_class_names(),
            vec!["aeroway_lines"]
        );
    }
}
