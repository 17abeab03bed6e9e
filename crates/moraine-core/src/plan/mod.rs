//! Module: plan
//! Responsibility: typed fetch-plan graphs over mapping metadata.
//! Does not own: query execution, collection state, snapshot handling.
//! Boundary: plans are append-only while building and immutable once built.

mod path;


use crate::model::{CollectionModel, CollectionRole, EntityModel};
use crate::types::{CompositeType, MappedType, ValueType};
use derive_more::Display;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error as ThisError;

pub use self::path::{ELEMENT_MARKER, INDEX_MARKER, PropertyPath};

///
/// FetchPlanError
///

#[derive(Debug, ThisError)]
pub enum FetchPlanError {
    #[error("node {node} is not a collection reference in this plan")]
    UnknownCollection { node: FetchNodeId },

    #[error("collection {role} does not declare a composite index")]
    NonCompositeIndex { role: CollectionRole },

    #[error("collection {role} does not declare a composite element")]
    NonCompositeElement { role: CollectionRole },

    #[error(
        "index descriptor {supplied} is not the descriptor {declared} declared by collection {role}"
    )]
    IndexTypeMismatch {
        role: CollectionRole,
        declared: String,
        supplied: String,
    },

    #[error(
        "element descriptor {supplied} is not the descriptor {declared} declared by collection {role}"
    )]
    ElementTypeMismatch {
        role: CollectionRole,
        declared: String,
        supplied: String,
    },

    #[error("fetch path {path} is already registered in this plan")]
    DuplicatePath { path: String },
}

// Arena ids. Only the builder mints them, so an id is valid exactly for the
// plan its builder produced.

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FetchNodeId(usize);

impl FetchNodeId {
    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FetchSourceId(usize);

impl FetchSourceId {
    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

#[derive(Clone, Copy, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct QuerySpaceId(usize);

impl QuerySpaceId {
    pub(crate) const fn index(self) -> usize {
        self.0
    }
}

///
/// QuerySpaceKind
///

#[derive(Clone, Copy, Debug, Display, Eq, PartialEq)]
pub enum QuerySpaceKind {
    Entity,
    Collection,
    Composite,
}

///
/// QuerySpace
///

#[derive(Debug)]
pub struct QuerySpace {
    id: QuerySpaceId,
    uid: String,
    kind: QuerySpaceKind,
}

impl QuerySpace {
    #[must_use]
    pub const fn id(&self) -> QuerySpaceId {
        self.id
    }

    #[must_use]
    pub fn uid(&self) -> &str {
        &self.uid
    }

    #[must_use]
    pub const fn kind(&self) -> QuerySpaceKind {
        self.kind
    }
}

///
/// FetchSourceKind
///
/// What defines a source. `Root` is the queried entity itself; the two
/// collection roots are defined by a collection reference node and anchor
/// its index and element graphs.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FetchSourceKind {
    Root { space: QuerySpaceId },
    CollectionIndexRoot { collection: FetchNodeId },
    CollectionElementRoot { collection: FetchNodeId },
}

///
/// FetchSource
///

#[derive(Debug)]
pub struct FetchSource {
    id: FetchSourceId,
    kind: FetchSourceKind,
}

impl FetchSource {
    #[must_use]
    pub const fn id(&self) -> FetchSourceId {
        self.id
    }

    #[must_use]
    pub const fn kind(&self) -> FetchSourceKind {
        self.kind
    }

    /// Node this source is defined by, `None` for the plan root.
    #[must_use]
    pub const fn defining_node(&self) -> Option<FetchNodeId> {
        match self.kind {
            FetchSourceKind::Root { .. } => None,
            FetchSourceKind::CollectionIndexRoot { collection }
            | FetchSourceKind::CollectionElementRoot { collection } => Some(collection),
        }
    }
}

///
/// AttributeFetch
///

#[derive(Debug)]
pub struct AttributeFetch {
    name: String,
    nullable: bool,
}

impl AttributeFetch {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }
}

///
/// CompositeFetch
///
/// A composite-typed fetch and the child fetches expanded from its
/// attributes, one per attribute in declaration order.
///

#[derive(Debug)]
pub struct CompositeFetch {
    descriptor: Arc<CompositeType>,
    nullable: bool,
    children: Vec<FetchNodeId>,
}

impl CompositeFetch {
    #[must_use]
    pub const fn descriptor(&self) -> &Arc<CompositeType> {
        &self.descriptor
    }

    #[must_use]
    pub const fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[must_use]
    pub fn children(&self) -> &[FetchNodeId] {
        &self.children
    }
}

///
/// CollectionReference
///
/// Fetch node referencing a mapped collection. The reference defines the
/// root sources its graphs hang off; composite graphs appended later
/// resolve their source through those roots, never through the graph node
/// itself.
///

#[derive(Debug)]
pub struct CollectionReference {
    model: Arc<CollectionModel>,
    index_source: Option<FetchSourceId>,
    element_source: FetchSourceId,
    index_graph: Option<FetchNodeId>,
    element_graph: Option<FetchNodeId>,
}

impl CollectionReference {
    #[must_use]
    pub const fn model(&self) -> &Arc<CollectionModel> {
        &self.model
    }

    /// Root source of the index graph, present for indexed semantics only.
    #[must_use]
    pub const fn index_source(&self) -> Option<FetchSourceId> {
        self.index_source
    }

    #[must_use]
    pub const fn element_source(&self) -> FetchSourceId {
        self.element_source
    }

    #[must_use]
    pub const fn index_graph(&self) -> Option<FetchNodeId> {
        self.index_graph
    }

    #[must_use]
    pub const fn element_graph(&self) -> Option<FetchNodeId> {
        self.element_graph
    }
}

///
/// FetchKind
///

#[derive(Debug)]
pub enum FetchKind {
    Attribute(AttributeFetch),
    Composite(CompositeFetch),
    Collection(CollectionReference),
    CollectionIndexGraph {
        collection: FetchNodeId,
        composite: CompositeFetch,
    },
    CollectionElementGraph {
        collection: FetchNodeId,
        composite: CompositeFetch,
    },
}

///
/// FetchNode
///

#[derive(Debug)]
pub struct FetchNode {
    id: FetchNodeId,
    path: PropertyPath,
    source: FetchSourceId,
    space: QuerySpaceId,
    kind: FetchKind,
}

impl FetchNode {
    #[must_use]
    pub const fn id(&self) -> FetchNodeId {
        self.id
    }

    #[must_use]
    pub const fn path(&self) -> &PropertyPath {
        &self.path
    }

    #[must_use]
    pub const fn source(&self) -> FetchSourceId {
        self.source
    }

    #[must_use]
    pub const fn query_space(&self) -> QuerySpaceId {
        self.space
    }

    #[must_use]
    pub const fn kind(&self) -> &FetchKind {
        &self.kind
    }

    #[must_use]
    pub const fn as_collection(&self) -> Option<&CollectionReference> {
        match &self.kind {
            FetchKind::Collection(reference) => Some(reference),
            _ => None,
        }
    }
}

///
/// FetchPlan
///
/// Immutable fetch graph. Nodes, sources and query spaces live in arenas
/// and cross-reference by id, so a built plan is cheap to share across
/// threads.
///

#[derive(Debug)]
pub struct FetchPlan {
    root_entity: String,
    nodes: Vec<FetchNode>,
    sources: Vec<FetchSource>,
    spaces: Vec<QuerySpace>,
    roots: Vec<FetchNodeId>,
}

impl FetchPlan {
    #[must_use]
    pub fn root_entity(&self) -> &str {
        &self.root_entity
    }

    #[must_use]
    pub fn roots(&self) -> &[FetchNodeId] {
        &self.roots
    }

    #[must_use]
    pub fn nodes(&self) -> &[FetchNode] {
        &self.nodes
    }

    #[must_use]
    pub fn sources(&self) -> &[FetchSource] {
        &self.sources
    }

    #[must_use]
    pub fn query_spaces(&self) -> &[QuerySpace] {
        &self.spaces
    }

    #[must_use]
    pub fn node(&self, id: FetchNodeId) -> Option<&FetchNode> {
        self.nodes.get(id.index())
    }

    #[must_use]
    pub fn source(&self, id: FetchSourceId) -> Option<&FetchSource> {
        self.sources.get(id.index())
    }

    #[must_use]
    pub fn query_space(&self, id: QuerySpaceId) -> Option<&QuerySpace> {
        self.spaces.get(id.index())
    }

    #[must_use]
    pub fn collection_reference(&self, id: FetchNodeId) -> Option<&CollectionReference> {
        self.node(id).and_then(FetchNode::as_collection)
    }
}

///
/// FetchPlanBuilder
///
/// Append-only construction of a `FetchPlan`. Every registered fetch path
/// must be unique within the plan.
///

#[derive(Debug)]
pub struct FetchPlanBuilder {
    root_entity: String,
    nodes: Vec<FetchNode>,
    sources: Vec<FetchSource>,
    spaces: Vec<QuerySpace>,
    roots: Vec<FetchNodeId>,
    paths: HashSet<String>,
    root_source: FetchSourceId,
    root_space: QuerySpaceId,
}

impl FetchPlanBuilder {
    #[must_use]
    pub fn new(root: &EntityModel) -> Self {
        let mut builder = Self {
            root_entity: root.name().to_string(),
            nodes: Vec::new(),
            sources: Vec::new(),
            spaces: Vec::new(),
            roots: Vec::new(),
            paths: HashSet::new(),
            root_source: FetchSourceId(0),
            root_space: QuerySpaceId(0),
        };

        builder.root_space = builder.add_space(QuerySpaceKind::Entity);
        builder.root_source = builder.add_source(FetchSourceKind::Root {
            space: builder.root_space,
        });

        builder
    }

    #[must_use]
    pub fn build(self) -> FetchPlan {
        FetchPlan {
            root_entity: self.root_entity,
            nodes: self.nodes,
            sources: self.sources,
            spaces: self.spaces,
            roots: self.roots,
        }
    }

    /// Fetch an attribute of the root entity.
    pub fn add_root_attribute(&mut self, name: &str) -> Result<FetchNodeId, FetchPlanError> {
        let path = PropertyPath::root(name);
        self.register_path(&path)?;

        let id = self.push_node(
            path,
            self.root_source,
            self.root_space,
            FetchKind::Attribute(AttributeFetch {
                name: name.to_string(),
                nullable: true,
            }),
        );
        self.roots.push(id);

        Ok(id)
    }

    /// Reference a mapped collection at the plan root.
    ///
    /// Defines the element root source and, for indexed semantics, the
    /// index root source the collection's graphs resolve through.
    pub fn add_collection_root(
        &mut self,
        model: &Arc<CollectionModel>,
    ) -> Result<FetchNodeId, FetchPlanError> {
        let path = PropertyPath::root(model.role().as_str());
        self.register_path(&path)?;

        let space = self.add_space(QuerySpaceKind::Collection);
        let id = self.next_node_id();

        let index_source = if model.semantics().is_indexed() {
            Some(self.add_source(FetchSourceKind::CollectionIndexRoot { collection: id }))
        } else {
            None
        };
        let element_source =
            self.add_source(FetchSourceKind::CollectionElementRoot { collection: id });

        let pushed = self.push_node(
            path,
            self.root_source,
            space,
            FetchKind::Collection(CollectionReference {
                model: Arc::clone(model),
                index_source,
                element_source,
                index_graph: None,
                element_graph: None,
            }),
        );
        debug_assert_eq!(pushed, id);
        self.roots.push(pushed);

        Ok(pushed)
    }

    /// Append the composite index graph of an indexed collection.
    ///
    /// `descriptor` must be the very descriptor the collection's mapping
    /// declares for its index; a structurally equal copy is rejected. The
    /// graph node sits at `<collection path>.<index>` and resolves its
    /// source through the collection's index root, so the graph node never
    /// acts as its own source. One attribute fetch is expanded per
    /// composite attribute, in declaration order.
    pub fn append_composite_index_graph(
        &mut self,
        collection: FetchNodeId,
        descriptor: &Arc<CompositeType>,
    ) -> Result<FetchNodeId, FetchPlanError> {
        let (model, base_path, index_source) = {
            let (node, reference) = self.collection_parts(collection)?;
            (
                Arc::clone(reference.model()),
                node.path.clone(),
                reference.index_source(),
            )
        };

        let Some(index_source) = index_source else {
            return Err(FetchPlanError::NonCompositeIndex {
                role: model.role().clone(),
            });
        };
        let Some(declared) = model.index_type().and_then(MappedType::as_composite) else {
            return Err(FetchPlanError::NonCompositeIndex {
                role: model.role().clone(),
            });
        };
        if !Arc::ptr_eq(declared, descriptor) {
            return Err(FetchPlanError::IndexTypeMismatch {
                role: model.role().clone(),
                declared: declared.name().to_string(),
                supplied: descriptor.name().to_string(),
            });
        }

        let path = base_path.index_graph();
        self.register_path(&path)?;

        let space = self.add_space(QuerySpaceKind::Composite);
        let children = self.expand_composite(descriptor, &path, index_source, space)?;

        // index of an indexed collection can never be null
        let id = self.push_node(
            path,
            index_source,
            space,
            FetchKind::CollectionIndexGraph {
                collection,
                composite: CompositeFetch {
                    descriptor: Arc::clone(descriptor),
                    nullable: false,
                    children,
                },
            },
        );

        if let Some(FetchKind::Collection(reference)) = self
            .nodes
            .get_mut(collection.index())
            .map(|node| &mut node.kind)
        {
            reference.index_graph = Some(id);
        }

        Ok(id)
    }

    /// Append the composite element graph of a collection.
    ///
    /// Same contract as the index graph, anchored at the collection's
    /// element root and `<collection path>.<element>`.
    pub fn append_composite_element_graph(
        &mut self,
        collection: FetchNodeId,
        descriptor: &Arc<CompositeType>,
    ) -> Result<FetchNodeId, FetchPlanError> {
        let (model, base_path, element_source) = {
            let (node, reference) = self.collection_parts(collection)?;
            (
                Arc::clone(reference.model()),
                node.path.clone(),
                reference.element_source(),
            )
        };

        let Some(declared) = model.element_type().as_composite() else {
            return Err(FetchPlanError::NonCompositeElement {
                role: model.role().clone(),
            });
        };
        if !Arc::ptr_eq(declared, descriptor) {
            return Err(FetchPlanError::ElementTypeMismatch {
                role: model.role().clone(),
                declared: declared.name().to_string(),
                supplied: descriptor.name().to_string(),
            });
        }

        let path = base_path.element_graph();
        self.register_path(&path)?;

        let space = self.add_space(QuerySpaceKind::Composite);
        let children = self.expand_composite(descriptor, &path, element_source, space)?;

        let id = self.push_node(
            path,
            element_source,
            space,
            FetchKind::CollectionElementGraph {
                collection,
                composite: CompositeFetch {
                    descriptor: Arc::clone(descriptor),
                    nullable: false,
                    children,
                },
            },
        );

        if let Some(FetchKind::Collection(reference)) = self
            .nodes
            .get_mut(collection.index())
            .map(|node| &mut node.kind)
        {
            reference.element_graph = Some(id);
        }

        Ok(id)
    }

    fn expand_composite(
        &mut self,
        descriptor: &Arc<CompositeType>,
        parent: &PropertyPath,
        source: FetchSourceId,
        space: QuerySpaceId,
    ) -> Result<Vec<FetchNodeId>, FetchPlanError> {
        let mut children = Vec::with_capacity(descriptor.attributes().len());

        for attribute in descriptor.attributes() {
            let path = parent.append(attribute.name());
            self.register_path(&path)?;

            let id = match attribute.ty() {
                MappedType::Scalar(_) => self.push_node(
                    path,
                    source,
                    space,
                    FetchKind::Attribute(AttributeFetch {
                        name: attribute.name().to_string(),
                        nullable: attribute.is_nullable(),
                    }),
                ),
                MappedType::Composite(inner) => {
                    let inner = Arc::clone(inner);
                    let nested = self.expand_composite(&inner, &path, source, space)?;

                    self.push_node(
                        path,
                        source,
                        space,
                        FetchKind::Composite(CompositeFetch {
                            descriptor: inner,
                            nullable: attribute.is_nullable(),
                            children: nested,
                        }),
                    )
                }
            };

            children.push(id);
        }

        Ok(children)
    }

    fn collection_parts(
        &self,
        id: FetchNodeId,
    ) -> Result<(&FetchNode, &CollectionReference), FetchPlanError> {
        match self.nodes.get(id.index()) {
            Some(node) => match &node.kind {
                FetchKind::Collection(reference) => Ok((node, reference)),
                _ => Err(FetchPlanError::UnknownCollection { node: id }),
            },
            None => Err(FetchPlanError::UnknownCollection { node: id }),
        }
    }

    fn register_path(&mut self, path: &PropertyPath) -> Result<(), FetchPlanError> {
        if self.paths.insert(path.as_str().to_string()) {
            Ok(())
        } else {
            Err(FetchPlanError::DuplicatePath {
                path: path.as_str().to_string(),
            })
        }
    }

    fn next_node_id(&self) -> FetchNodeId {
        FetchNodeId(self.nodes.len())
    }

    fn push_node(
        &mut self,
        path: PropertyPath,
        source: FetchSourceId,
        space: QuerySpaceId,
        kind: FetchKind,
    ) -> FetchNodeId {
        let id = self.next_node_id();
        self.nodes.push(FetchNode {
            id,
            path,
            source,
            space,
            kind,
        });

        id
    }

    fn add_source(&mut self, kind: FetchSourceKind) -> FetchSourceId {
        let id = FetchSourceId(self.sources.len());
        self.sources.push(FetchSource { id, kind });

        id
    }

    fn add_space(&mut self, kind: QuerySpaceKind) -> QuerySpaceId {
        let n = self.spaces.len();
        let id = QuerySpaceId(n);
        self.spaces.push(QuerySpace {
            id,
            uid: format!("space{n}"),
            kind,
        });

        id
    }
}
