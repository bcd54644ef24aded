//! Default-feature catalog and injector.
//!
//! The legacy build system treats a fixed set of features as implicitly
//! present even when a CROSSTOOL never declares them, each at a well-known
//! position in the feature evaluation order. The catalog below reproduces
//! that set — name, canonical rank, and template body — as an immutable
//! table built once and passed explicitly to the injector.
//!
//! Injection interleaves missing defaults into the authored sequence by
//! rank. A default is inserted where it would have sat had it been declared:
//! before the first explicit feature whose own canonical rank exceeds it.
//! Explicitly declared features always keep their authored position, even
//! when the author reordered them against canonical rank; explicit features
//! with no catalog rank never constrain the merge. Downstream flag
//! computation depends on this exact order, so a wrong merge silently
//! changes which flags reach real compilations.

use std::collections::HashSet;

use crosstool_model::{Feature, FlagGroup, FlagSet};

use crate::error::Warning;

const CC_COMPILE_ACTIONS: &[&str] = &[
    "assemble",
    "preprocess-assemble",
    "linkstamp-compile",
    "c-compile",
    "c++-compile",
    "c++-header-parsing",
    "c++-module-compile",
    "c++-module-codegen",
    "lto-backend",
    "clif-match",
];

const CC_LINK_ACTIONS: &[&str] = &[
    "c++-link-executable",
    "c++-link-dynamic-library",
    "c++-link-nodeps-dynamic-library",
];

const DYNAMIC_LIBRARY_LINK_ACTIONS: &[&str] = &[
    "c++-link-dynamic-library",
    "c++-link-nodeps-dynamic-library",
];

struct CatalogEntry {
    name: &'static str,
    template: fn() -> Feature,
}

/// Immutable, versioned table of the legacy default features, ordered by
/// canonical rank.
pub struct DefaultCatalog {
    entries: Vec<CatalogEntry>,
}

impl DefaultCatalog {
    /// The catalog matching the legacy build system's documented default
    /// feature semantics.
    pub fn legacy() -> Self {
        DefaultCatalog {
            entries: vec![
                CatalogEntry {
                    name: "dependency_file",
                    template: dependency_file,
                },
                CatalogEntry {
                    name: "random_seed",
                    template: random_seed,
                },
                CatalogEntry {
                    name: "pic",
                    template: pic,
                },
                CatalogEntry {
                    name: "per_object_debug_info",
                    template: per_object_debug_info,
                },
                CatalogEntry {
                    name: "preprocessor_defines",
                    template: preprocessor_defines,
                },
                CatalogEntry {
                    name: "includes",
                    template: includes,
                },
                CatalogEntry {
                    name: "include_paths",
                    template: include_paths,
                },
                CatalogEntry {
                    name: "module_maps",
                    template: module_maps,
                },
                CatalogEntry {
                    name: "shared_flag",
                    template: shared_flag,
                },
                CatalogEntry {
                    name: "output_execpath_flags",
                    template: output_execpath_flags,
                },
                CatalogEntry {
                    name: "runtime_library_search_directories",
                    template: runtime_library_search_directories,
                },
                CatalogEntry {
                    name: "library_search_directories",
                    template: library_search_directories,
                },
                CatalogEntry {
                    name: "libraries_to_link",
                    template: libraries_to_link,
                },
                CatalogEntry {
                    name: "user_link_flags",
                    template: user_link_flags,
                },
                CatalogEntry {
                    name: "linker_param_file",
                    template: linker_param_file,
                },
                CatalogEntry {
                    name: "coverage",
                    template: coverage,
                },
                CatalogEntry {
                    name: "user_compile_flags",
                    template: user_compile_flags,
                },
                CatalogEntry {
                    name: "sysroot",
                    template: sysroot,
                },
                CatalogEntry {
                    name: "unfiltered_compile_flags",
                    template: unfiltered_compile_flags,
                },
                CatalogEntry {
                    name: "compiler_input_flags",
                    template: compiler_input_flags,
                },
                CatalogEntry {
                    name: "compiler_output_flags",
                    template: compiler_output_flags,
                },
            ],
        }
    }

    /// Canonical rank of a default feature name, if it is one.
    pub fn rank_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name == name)
    }

    /// All default feature names in rank order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|entry| entry.name)
    }
}

/// Merge the catalog's missing defaults into the authored feature sequence.
pub fn inject_defaults(
    catalog: &DefaultCatalog,
    explicit: &[Feature],
    warnings: &mut Vec<Warning>,
) -> Vec<Feature> {
    let mut seen: HashSet<&str> = HashSet::new();
    for feature in explicit {
        if !seen.insert(feature.name.as_str()) {
            warnings.push(Warning::new(format!(
                "feature '{}' is declared more than once; both declarations are \
                 reproduced as authored",
                feature.name
            )));
        }
    }

    let declared: HashSet<&str> = explicit.iter().map(|f| f.name.as_str()).collect();
    let mut missing = catalog
        .entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !declared.contains(entry.name))
        .peekable();

    let mut merged = Vec::with_capacity(explicit.len() + catalog.entries.len());
    for feature in explicit {
        if let Some(rank) = catalog.rank_of(&feature.name) {
            while let Some((missing_rank, entry)) = missing.peek() {
                if *missing_rank < rank {
                    merged.push((entry.template)());
                    missing.next();
                } else {
                    break;
                }
            }
        }
        merged.push(feature.clone());
    }
    for (_, entry) in missing {
        merged.push((entry.template)());
    }
    merged
}

fn flag_set(actions: &[&str], flag_groups: Vec<FlagGroup>) -> FlagSet {
    FlagSet {
        actions: actions.iter().map(|s| s.to_string()).collect(),
        with_features: Vec::new(),
        flag_groups,
    }
}

/// A flag group gated on a build variable being available.
fn available_group(variable: &str, flags: &[&str]) -> FlagGroup {
    let mut group = FlagGroup::flags(flags.iter().copied());
    group.expand_if_all_available = vec![variable.to_string()];
    group
}

/// A flag group iterating over a (guarded) build variable.
fn iterate_group(variable: &str, flags: &[&str]) -> FlagGroup {
    let mut group = available_group(variable, flags);
    group.iterate_over = Some(variable.to_string());
    group
}

fn enabled(mut feature: Feature) -> Feature {
    feature.enabled = true;
    feature
}

fn dependency_file() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            &[
                "assemble",
                "preprocess-assemble",
                "c-compile",
                "c++-compile",
                "c++-module-compile",
                "c++-header-parsing",
                "clif-match",
            ],
            vec![available_group(
                "dependency_file",
                &["-MD", "-MF", "%{dependency_file}"],
            )],
        )],
        ..Feature::named("dependency_file")
    })
}

fn random_seed() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            &[
                "c-compile",
                "c++-compile",
                "c++-module-codegen",
                "c++-module-compile",
            ],
            vec![available_group(
                "output_file",
                &["-frandom-seed=%{output_file}"],
            )],
        )],
        ..Feature::named("random_seed")
    })
}

fn pic() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            &[
                "assemble",
                "preprocess-assemble",
                "linkstamp-compile",
                "c-compile",
                "c++-compile",
                "c++-module-codegen",
                "c++-module-compile",
            ],
            vec![available_group("pic", &["-fPIC"])],
        )],
        ..Feature::named("pic")
    })
}

fn per_object_debug_info() -> Feature {
    Feature {
        flag_sets: vec![flag_set(
            &[
                "assemble",
                "preprocess-assemble",
                "c-compile",
                "c++-compile",
                "c++-module-codegen",
                "lto-backend",
            ],
            vec![available_group(
                "per_object_debug_info_file",
                &["-gsplit-dwarf"],
            )],
        )],
        ..Feature::named("per_object_debug_info")
    }
}

fn preprocessor_defines() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            &[
                "preprocess-assemble",
                "linkstamp-compile",
                "c-compile",
                "c++-compile",
                "c++-header-parsing",
                "c++-module-compile",
                "clif-match",
            ],
            vec![{
                let mut group = FlagGroup::flags(["-D%{preprocessor_defines}"]);
                group.iterate_over = Some("preprocessor_defines".to_string());
                group
            }],
        )],
        ..Feature::named("preprocessor_defines")
    })
}

fn includes() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            &[
                "preprocess-assemble",
                "linkstamp-compile",
                "c-compile",
                "c++-compile",
                "c++-header-parsing",
                "c++-module-compile",
                "objc-compile",
                "objc++-compile",
                "clif-match",
            ],
            vec![iterate_group("includes", &["-include", "%{includes}"])],
        )],
        ..Feature::named("includes")
    })
}

fn include_paths() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            &[
                "preprocess-assemble",
                "linkstamp-compile",
                "c-compile",
                "c++-compile",
                "c++-header-parsing",
                "c++-module-compile",
                "clif-match",
            ],
            vec![
                {
                    let mut group = FlagGroup::flags(["-iquote", "%{quote_include_paths}"]);
                    group.iterate_over = Some("quote_include_paths".to_string());
                    group
                },
                {
                    let mut group = FlagGroup::flags(["-I%{include_paths}"]);
                    group.iterate_over = Some("include_paths".to_string());
                    group
                },
                {
                    let mut group = FlagGroup::flags(["-isystem", "%{system_include_paths}"]);
                    group.iterate_over = Some("system_include_paths".to_string());
                    group
                },
            ],
        )],
        ..Feature::named("include_paths")
    })
}

fn module_maps() -> Feature {
    // Marker feature: its presence tells the build system module maps are
    // supported; the flags live on the module-map-aware actions themselves.
    enabled(Feature::named("module_maps"))
}

fn shared_flag() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            DYNAMIC_LIBRARY_LINK_ACTIONS,
            vec![FlagGroup::flags(["-shared"])],
        )],
        ..Feature::named("shared_flag")
    })
}

fn output_execpath_flags() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            CC_LINK_ACTIONS,
            vec![available_group(
                "output_execpath",
                &["-o", "%{output_execpath}"],
            )],
        )],
        ..Feature::named("output_execpath_flags")
    })
}

fn runtime_library_search_directories() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            CC_LINK_ACTIONS,
            vec![iterate_group(
                "runtime_library_search_directories",
                &["-Wl,-rpath,$ORIGIN/%{runtime_library_search_directories}"],
            )],
        )],
        ..Feature::named("runtime_library_search_directories")
    })
}

fn library_search_directories() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            CC_LINK_ACTIONS,
            vec![iterate_group(
                "library_search_directories",
                &["-L%{library_search_directories}"],
            )],
        )],
        ..Feature::named("library_search_directories")
    })
}

fn libraries_to_link() -> Feature {
    let whole_archive_open = {
        let mut group = FlagGroup::flags(["-Wl,-whole-archive"]);
        group.expand_if_true = Some("libraries_to_link.is_whole_archive".to_string());
        group
    };
    let object_file = {
        let mut group = FlagGroup::flags(["%{libraries_to_link.name}"]);
        group.expand_if_equal = Some(crosstool_model::VariableWithValue {
            variable: "libraries_to_link.type".to_string(),
            value: "object_file".to_string(),
        });
        group
    };
    let static_library = {
        let mut group = FlagGroup::flags(["%{libraries_to_link.name}"]);
        group.expand_if_equal = Some(crosstool_model::VariableWithValue {
            variable: "libraries_to_link.type".to_string(),
            value: "static_library".to_string(),
        });
        group
    };
    let dynamic_library = {
        let mut group = FlagGroup::flags(["-l%{libraries_to_link.name}"]);
        group.expand_if_equal = Some(crosstool_model::VariableWithValue {
            variable: "libraries_to_link.type".to_string(),
            value: "dynamic_library".to_string(),
        });
        group
    };
    let versioned_dynamic_library = {
        let mut group = FlagGroup::flags(["-l:%{libraries_to_link.name}"]);
        group.expand_if_equal = Some(crosstool_model::VariableWithValue {
            variable: "libraries_to_link.type".to_string(),
            value: "versioned_dynamic_library".to_string(),
        });
        group
    };
    let interface_library = {
        let mut group = FlagGroup::flags(["%{libraries_to_link.name}"]);
        group.expand_if_equal = Some(crosstool_model::VariableWithValue {
            variable: "libraries_to_link.type".to_string(),
            value: "interface_library".to_string(),
        });
        group
    };
    let whole_archive_close = {
        let mut group = FlagGroup::flags(["-Wl,-no-whole-archive"]);
        group.expand_if_true = Some("libraries_to_link.is_whole_archive".to_string());
        group
    };
    let mut outer = FlagGroup::groups(vec![
        whole_archive_open,
        object_file,
        static_library,
        dynamic_library,
        versioned_dynamic_library,
        interface_library,
        whole_archive_close,
    ]);
    outer.iterate_over = Some("libraries_to_link".to_string());
    outer.expand_if_all_available = vec!["libraries_to_link".to_string()];

    enabled(Feature {
        flag_sets: vec![flag_set(CC_LINK_ACTIONS, vec![outer])],
        ..Feature::named("libraries_to_link")
    })
}

fn user_link_flags() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            CC_LINK_ACTIONS,
            vec![iterate_group("user_link_flags", &["%{user_link_flags}"])],
        )],
        ..Feature::named("user_link_flags")
    })
}

fn linker_param_file() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            &[
                "c++-link-executable",
                "c++-link-dynamic-library",
                "c++-link-nodeps-dynamic-library",
                "c++-link-static-library",
            ],
            vec![available_group(
                "linker_param_file",
                &["@%{linker_param_file}"],
            )],
        )],
        ..Feature::named("linker_param_file")
    })
}

fn coverage() -> Feature {
    // Marker feature toggled per-build; instrumentation flags arrive through
    // the coverage-specific build variables when it is active.
    Feature::named("coverage")
}

fn user_compile_flags() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            CC_COMPILE_ACTIONS,
            vec![iterate_group(
                "user_compile_flags",
                &["%{user_compile_flags}"],
            )],
        )],
        ..Feature::named("user_compile_flags")
    })
}

fn sysroot() -> Feature {
    let actions: Vec<&str> = CC_COMPILE_ACTIONS
        .iter()
        .chain(CC_LINK_ACTIONS)
        .copied()
        .collect();
    enabled(Feature {
        flag_sets: vec![flag_set(
            &actions,
            vec![available_group("sysroot", &["--sysroot=%{sysroot}"])],
        )],
        ..Feature::named("sysroot")
    })
}

fn unfiltered_compile_flags() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            CC_COMPILE_ACTIONS,
            vec![iterate_group(
                "unfiltered_compile_flags",
                &["%{unfiltered_compile_flags}"],
            )],
        )],
        ..Feature::named("unfiltered_compile_flags")
    })
}

fn compiler_input_flags() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            &[
                "assemble",
                "preprocess-assemble",
                "linkstamp-compile",
                "c-compile",
                "c++-compile",
                "c++-header-parsing",
                "c++-module-compile",
                "c++-module-codegen",
                "lto-backend",
            ],
            vec![available_group("source_file", &["-c", "%{source_file}"])],
        )],
        ..Feature::named("compiler_input_flags")
    })
}

fn compiler_output_flags() -> Feature {
    enabled(Feature {
        flag_sets: vec![flag_set(
            &[
                "assemble",
                "preprocess-assemble",
                "linkstamp-compile",
                "c-compile",
                "c++-compile",
                "c++-header-parsing",
                "c++-module-compile",
                "c++-module-codegen",
                "lto-backend",
            ],
            vec![
                available_group("output_assembly_file", &["-S"]),
                available_group("output_preprocess_file", &["-E"]),
                available_group("output_file", &["-o", "%{output_file}"]),
            ],
        )],
        ..Feature::named("compiler_output_flags")
    })
}
