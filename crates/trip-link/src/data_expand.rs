//! Data expander (spec §4.8): lowers `data` declarations to a type alias
//! plus Scott-encoded constructors, before the resolver ever sees them.

use std::collections::BTreeSet;
use std::sync::Arc;

use trip_ast::ty::BaseType;
use trip_ast::{Definition, PolyTerm};
use trip_common::{LinkError, LocalName, ModuleName, QualifiedName};
use trip_subst::fresh_name;

use crate::program_space::ProgramSpace;

pub fn expand_data_declarations(space: &mut ProgramSpace) -> Result<(), LinkError> {
    let module_names: Vec<ModuleName> = space.modules.keys().cloned().collect();

    for module_name in module_names {
        let data_defs: Vec<(String, Definition)> = space.modules[&module_name]
            .definitions
            .iter()
            .filter(|(_, def)| matches!(def, Definition::Data { .. }))
            .map(|(local, def)| (local.clone(), def.clone()))
            .collect();

        for (local, def) in data_defs {
            let Definition::Data {
                name,
                type_params,
                constructors,
            } = def
            else {
                unreachable!("filtered to Data above")
            };

            let expanded = expand_one(&module_name, &name, &type_params, &constructors)?;

            space.modules.get_mut(&module_name).unwrap().definitions.remove(&local);
            for (def_name, new_def) in expanded {
                let q = QualifiedName::new(module_name.clone(), LocalName::new(def_name));
                space.write(&q, new_def);
            }
        }
    }

    Ok(())
}

fn expand_one(
    module: &ModuleName,
    name: &LocalName,
    type_params: &[String],
    constructors: &[(LocalName, Vec<Arc<BaseType>>)],
) -> Result<Vec<(String, Definition)>, LinkError> {
    if constructors.is_empty() {
        return Err(malformed(module, name, "data declaration has no constructors"));
    }

    let mut seen_ctors = BTreeSet::new();
    for (ctor, _) in constructors {
        if ctor.as_str() == name.as_str() {
            return Err(malformed(
                module,
                name,
                &format!("constructor `{ctor}` has the same name as the data type"),
            ));
        }
        if !seen_ctors.insert(ctor.as_str().to_string()) {
            return Err(malformed(module, name, &format!("duplicate constructor name `{ctor}`")));
        }
    }
    let mut seen_params = BTreeSet::new();
    for p in type_params {
        if !seen_params.insert(p.clone()) {
            return Err(malformed(module, name, &format!("duplicate type parameter `{p}`")));
        }
    }

    let mut avoid: BTreeSet<String> = type_params.iter().cloned().collect();
    avoid.insert(name.as_str().to_string());
    let r = fresh_name("R", &avoid);

    // Each constructor's eliminator-arm type: F1 -> F2 -> ... -> Fk -> R.
    let case_types: Vec<Arc<BaseType>> = constructors
        .iter()
        .map(|(_, fields)| fold_arrow(fields, BaseType::var(r.clone())))
        .collect();
    // ∀R. case1 -> case2 -> ... -> caseN -> R
    let eliminator = BaseType::forall(r.clone(), fold_arrow(&case_types, BaseType::var(r.clone())));
    // One Forall per type parameter, outermost first.
    let alias_body = type_params.iter().rev().fold(eliminator, |acc, p| BaseType::forall(p.clone(), acc));

    let mut out = vec![(
        name.as_str().to_string(),
        Definition::Type {
            name: name.clone(),
            ty: alias_body,
        },
    )];

    for (idx, (ctor, fields)) in constructors.iter().enumerate() {
        let field_names: Vec<String> = (0..fields.len()).map(|i| format!("f{i}")).collect();
        let case_names: Vec<String> = (0..constructors.len()).map(|i| format!("c{i}")).collect();

        // caseIdx f0 f1 ... fk
        let mut body: Arc<PolyTerm> = Arc::new(PolyTerm::Var(case_names[idx].clone()));
        for fname in &field_names {
            body = Arc::new(PolyTerm::App(body, Arc::new(PolyTerm::Var(fname.clone()))));
        }
        // \case0:T0. ... \caseN:TN. body
        for (cname, ctype) in case_names.iter().zip(case_types.iter()).rev() {
            body = Arc::new(PolyTerm::Abs(cname.clone(), ctype.clone(), body));
        }
        // /\R. ...
        body = Arc::new(PolyTerm::TAbs(r.clone(), body));
        // \f0:F0. ... \fk:Fk. ...
        for (fname, ftype) in field_names.iter().zip(fields.iter()).rev() {
            body = Arc::new(PolyTerm::Abs(fname.clone(), ftype.clone(), body));
        }
        // /\p1. ... /\pm. ...
        for p in type_params.iter().rev() {
            body = Arc::new(PolyTerm::TAbs(p.clone(), body));
        }

        out.push((
            ctor.as_str().to_string(),
            Definition::Poly {
                name: ctor.clone(),
                ty: None,
                term: body,
                rec: false,
            },
        ));
    }

    Ok(out)
}

fn fold_arrow(fields: &[Arc<BaseType>], result: Arc<BaseType>) -> Arc<BaseType> {
    fields.iter().rev().fold(result, |acc, f| BaseType::arrow(f.clone(), acc))
}

fn malformed(module: &ModuleName, name: &LocalName, reason: &str) -> LinkError {
    LinkError::DataMalformed {
        module: module.clone(),
        name: name.clone(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trip_ast::Definition;
    use trip_object::TripCObject;

    fn maybe_module() -> TripCObject {
        TripCObject::from_definitions(
            ModuleName::new("M"),
            vec![Definition::Data {
                name: LocalName::new("Maybe"),
                type_params: vec!["a".to_string()],
                constructors: vec![
                    (LocalName::new("Nothing"), vec![]),
                    (LocalName::new("Just"), vec![BaseType::var("a")]),
                ],
            }],
        )
        .unwrap()
    }

    #[test]
    fn expands_into_a_type_alias_and_one_poly_per_constructor() {
        let mut space = ProgramSpace::build(vec![maybe_module()]).unwrap();
        expand_data_declarations(&mut space).unwrap();
        let module = &space.modules[&ModuleName::new("M")];
        assert!(module.definitions.contains_key("Maybe"));
        assert!(module.definitions.contains_key("Nothing"));
        assert!(module.definitions.contains_key("Just"));
        assert!(matches!(module.definitions["Maybe"], Definition::Type { .. }));
        assert!(matches!(module.definitions["Nothing"], Definition::Poly { .. }));
    }

    #[test]
    fn no_constructors_is_malformed() {
        let object = TripCObject::from_definitions(
            ModuleName::new("M"),
            vec![Definition::Data {
                name: LocalName::new("Void"),
                type_params: vec![],
                constructors: vec![],
            }],
        )
        .unwrap();
        let mut space = ProgramSpace::build(vec![object]).unwrap();
        let err = expand_data_declarations(&mut space).unwrap_err();
        assert!(matches!(err, LinkError::DataMalformed { .. }));
    }

    #[test]
    fn constructor_named_like_the_type_is_malformed() {
        let object = TripCObject::from_definitions(
            ModuleName::new("M"),
            vec![Definition::Data {
                name: LocalName::new("Bad"),
                type_params: vec![],
                constructors: vec![(LocalName::new("Bad"), vec![])],
            }],
        )
        .unwrap();
        let mut space = ProgramSpace::build(vec![object]).unwrap();
        let err = expand_data_declarations(&mut space).unwrap_err();
        assert!(matches!(err, LinkError::DataMalformed { .. }));
    }
}
