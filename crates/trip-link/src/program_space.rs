//! Program space construction (spec §4.4): three passes over a set of
//! loaded modules turning their raw definitions into the indexed working
//! state the resolver mutates.

use std::collections::{BTreeMap, BTreeSet};

use trip_ast::Definition;
use trip_common::{LinkError, LocalName, ModuleName, QualifiedName};
use trip_object::{ImportEntry, TripCObject};

/// A loaded module: its own definitions, which are exported, and what it
/// imports. Unlike `TripCObject`, `definitions` only ever holds term/type
/// kinds -- `TripCObject::from_definitions` already split `Module`/
/// `Import`/`Export` markers out.
#[derive(Debug, Clone)]
pub struct LoadedModule {
    pub name: ModuleName,
    pub definitions: BTreeMap<String, Definition>,
    pub exports: BTreeSet<String>,
    pub imports: Vec<ImportEntry>,
}

impl From<TripCObject> for LoadedModule {
    fn from(object: TripCObject) -> Self {
        LoadedModule {
            name: object.module,
            definitions: object.definitions,
            exports: object.exports,
            imports: object.imports,
        }
    }
}

/// The linker's working state. Mutated in place by the resolver; read-only
/// once `resolve_cross_module_dependencies` returns.
#[derive(Debug, Clone, Default)]
pub struct ProgramSpace {
    pub modules: BTreeMap<ModuleName, LoadedModule>,
    pub terms: BTreeMap<QualifiedName, Definition>,
    pub types: BTreeMap<QualifiedName, Definition>,
    pub term_env: BTreeMap<ModuleName, BTreeMap<String, QualifiedName>>,
    pub type_env: BTreeMap<ModuleName, BTreeMap<String, QualifiedName>>,
}

impl ProgramSpace {
    pub fn build(objects: Vec<TripCObject>) -> Result<ProgramSpace, LinkError> {
        let mut space = ProgramSpace::default();

        // Pass 1: initialise.
        for object in objects {
            let module_name = object.module.clone();
            let loaded: LoadedModule = object.into();
            space.term_env.insert(module_name.clone(), BTreeMap::new());
            space.type_env.insert(module_name.clone(), BTreeMap::new());
            for (local, def) in &loaded.definitions {
                let q = QualifiedName::new(module_name.clone(), LocalName::new(local.clone()));
                if def.is_type_kind() {
                    space.types.insert(q, def.clone());
                } else if def.is_term_kind() {
                    space.terms.insert(q, def.clone());
                }
            }
            space.modules.insert(module_name, loaded);
        }

        // Pass 2: validate exports.
        let mut exporters: BTreeMap<String, Vec<ModuleName>> = BTreeMap::new();
        for module in space.modules.values() {
            for name in &module.exports {
                exporters.entry(name.clone()).or_default().push(module.name.clone());
            }
        }
        for (name, mods) in &exporters {
            if mods.len() > 1 {
                return Err(LinkError::AmbiguousExport {
                    name: LocalName::new(name.clone()),
                    exporters: mods.clone(),
                });
            }
        }

        // Pass 3: build import environments.
        let importing_modules: Vec<ModuleName> = space.modules.keys().cloned().collect();
        for importing_module in importing_modules {
            let imports = space.modules[&importing_module].imports.clone();
            for imp in imports {
                if !space.modules.contains_key(&imp.from) {
                    return Err(LinkError::UnknownModule {
                        importing_module: importing_module.clone(),
                        from: imp.from.clone(),
                    });
                }
                if !space.modules[&imp.from].exports.contains(imp.name.as_str()) {
                    return Err(LinkError::NotExported {
                        importing_module: importing_module.clone(),
                        from: imp.from.clone(),
                        name: imp.name.clone(),
                    });
                }
                let qualified = QualifiedName::new(imp.from.clone(), imp.name.clone());
                let is_type = space.types.contains_key(&qualified);
                let is_term = space.terms.contains_key(&qualified);
                if !is_type && !is_term {
                    return Err(LinkError::NoSuchSymbol {
                        importing_module: importing_module.clone(),
                        from: imp.from.clone(),
                        name: imp.name.clone(),
                    });
                }
                let alias = imp.r#as.clone().unwrap_or_else(|| imp.name.clone());
                let env = if is_term {
                    space.term_env.get_mut(&importing_module).unwrap()
                } else {
                    space.type_env.get_mut(&importing_module).unwrap()
                };
                if env.contains_key(alias.as_str()) {
                    return Err(LinkError::DuplicateImport {
                        module: importing_module.clone(),
                        alias,
                    });
                }
                env.insert(alias.as_str().to_string(), qualified);
            }
        }

        Ok(space)
    }

    pub fn lookup(&self, q: &QualifiedName) -> Option<&Definition> {
        self.terms.get(q).or_else(|| self.types.get(q))
    }

    pub fn write(&mut self, q: &QualifiedName, def: Definition) {
        if def.is_type_kind() {
            self.types.insert(q.clone(), def.clone());
        } else {
            self.terms.insert(q.clone(), def.clone());
        }
        if let Some(module) = self.modules.get_mut(&q.module) {
            module.definitions.insert(q.local.as_str().to_string(), def);
        }
    }
}
