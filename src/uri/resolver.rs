//! Resource-path and query-option resolution
//!
//! The path is walked left to right with an explicit current-state machine:
//! first segment to an entity set or function import, then key predicates,
//! navigation, property drilling and the `$links`/`$count`/`$value` system
//! segments. Query options are validated independently once the target is
//! known. Resolution is atomic: any failure aborts the whole resolve and
//! no partial [`UriInfo`] escapes.

use super::error::{UriError, UriNotMatchingError, UriResult, UriSyntaxError};
use super::info::{
    Format, InlineCount, KeyPredicate, NavigationSegment, SelectItem, UriInfo, UriKind,
};
use crate::edm::{ComplexType, EntityDataModel, EntitySet, EntityType, PropertyKind};
use crate::parser::{ParserLimits, parse_filter, parse_literal, parse_order_by};
use rustc_hash::FxHashSet;
use std::sync::Arc;

/// Resolves raw path segments and query options against a model.
pub struct UriParser<'m> {
    model: &'m dyn EntityDataModel,
    limits: ParserLimits,
}

/// Where the path walk currently stands.
enum State {
    /// A collection of entities; a standalone key segment may follow.
    Collection { links: bool },
    /// A single entity.
    Entity { links: bool },
    /// Inside a complex property.
    Complex(Arc<ComplexType>),
    /// At a simple property.
    Simple,
    /// After `$value`.
    AfterValue { on_property: bool },
    /// After `$count`.
    AfterCount { links: bool },
    /// `$links` seen, navigation segment required next.
    AwaitingLinksNav,
}

impl<'m> UriParser<'m> {
    /// Create a resolver with default parser limits.
    pub fn new(model: &'m dyn EntityDataModel) -> Self {
        Self {
            model,
            limits: ParserLimits::default(),
        }
    }

    /// Create a resolver with explicit parser limits.
    pub fn with_limits(model: &'m dyn EntityDataModel, limits: ParserLimits) -> Self {
        Self { model, limits }
    }

    /// Resolve percent-decoded path segments and query options into a
    /// [`UriInfo`].
    pub fn parse(
        &self,
        path_segments: &[&str],
        query_options: &[(&str, &str)],
    ) -> UriResult<UriInfo> {
        let (mut info, state) = self.walk_path(path_segments)?;
        self.apply_query_options(&mut info, &state, query_options)?;
        info.kind = final_kind(&info, &state)?;
        Ok(info)
    }

    fn walk_path(&self, segments: &[&str]) -> UriResult<(UriInfo, State)> {
        if segments.is_empty() {
            return Ok((
                UriInfo::new(UriKind::ServiceDocument),
                State::AfterValue { on_property: false },
            ));
        }
        if segments[0] == "$metadata" {
            if segments.len() > 1 {
                return Err(UriSyntaxError::SegmentNotAllowed {
                    segment: segments[1].to_string(),
                    after: "$metadata",
                }
                .into());
            }
            return Ok((
                UriInfo::new(UriKind::Metadata),
                State::AfterValue { on_property: false },
            ));
        }

        let mut info = UriInfo::new(UriKind::EntitySet);
        let mut state = self.resolve_first_segment(&mut info, segments[0])?;

        for &segment in &segments[1..] {
            log::trace!("resolving path segment '{segment}'");
            state = self.resolve_segment(&mut info, state, segment)?;
        }
        Ok((info, state))
    }

    /// First segment: entity set or function import, with an optional
    /// inline key predicate.
    fn resolve_first_segment(&self, info: &mut UriInfo, segment: &str) -> UriResult<State> {
        let (name, key_text) = split_segment(segment)?;

        if let Some(set) = self.model.entity_set(name) {
            let entity_type = self.entity_type_of(&set)?;
            info.start_entity_set = Some(Arc::clone(&set));
            info.target_entity_set = Some(set);
            info.target_entity_type = Some(Arc::clone(&entity_type));
            return match key_text {
                Some(raw) => {
                    info.key_predicates = self.parse_key_predicates(raw, &entity_type)?;
                    Ok(State::Entity { links: false })
                }
                None => Ok(State::Collection { links: false }),
            };
        }

        if let Some(import) = self.model.function_import(name) {
            let set = self.model.entity_set(&import.entity_set).ok_or_else(|| {
                UriNotMatchingError::UnknownResource {
                    name: import.entity_set.clone(),
                }
            })?;
            let entity_type = self.entity_type_of(&set)?;
            info.function_import = Some(import.clone());
            info.start_entity_set = Some(Arc::clone(&set));
            info.target_entity_set = Some(set);
            info.target_entity_type = Some(Arc::clone(&entity_type));
            return match key_text {
                Some(raw) if import.returns_collection => {
                    info.key_predicates = self.parse_key_predicates(raw, &entity_type)?;
                    Ok(State::Entity { links: false })
                }
                Some(_) => Err(UriSyntaxError::SegmentNotAllowed {
                    segment: segment.to_string(),
                    after: "a single-entity function import",
                }
                .into()),
                None if import.returns_collection => Ok(State::Collection { links: false }),
                None => Ok(State::Entity { links: false }),
            };
        }

        Err(UriNotMatchingError::UnknownResource {
            name: name.to_string(),
        }
        .into())
    }

    fn resolve_segment(&self, info: &mut UriInfo, state: State, segment: &str) -> UriResult<State> {
        match state {
            State::Collection { links } => self.resolve_on_collection(info, segment, links),
            State::Entity { links } => self.resolve_on_entity(info, segment, links),
            State::Complex(complex) => self.resolve_on_complex(info, segment, &complex),
            State::Simple => match segment {
                "$value" => {
                    info.value = true;
                    Ok(State::AfterValue { on_property: true })
                }
                _ => Err(UriSyntaxError::SegmentNotAllowed {
                    segment: segment.to_string(),
                    after: "a property",
                }
                .into()),
            },
            State::AfterValue { .. } => Err(UriSyntaxError::SegmentNotAllowed {
                segment: segment.to_string(),
                after: "$value",
            }
            .into()),
            State::AfterCount { .. } => Err(UriSyntaxError::SegmentNotAllowed {
                segment: segment.to_string(),
                after: "$count",
            }
            .into()),
            State::AwaitingLinksNav => self.resolve_links_navigation(info, segment),
        }
    }

    fn resolve_on_collection(
        &self,
        info: &mut UriInfo,
        segment: &str,
        links: bool,
    ) -> UriResult<State> {
        if segment == "$count" {
            info.count = true;
            return Ok(State::AfterCount { links });
        }
        if segment.starts_with('$') {
            return Err(UriSyntaxError::SegmentNotAllowed {
                segment: segment.to_string(),
                after: "an entity collection",
            }
            .into());
        }
        // A standalone segment after a collection is a key predicate, the
        // same grammar as the inline parenthesized form.
        let entity_type = self.current_entity_type(info)?;
        let keys = self.parse_key_predicates(segment, &entity_type)?;
        push_keys(info, keys);
        Ok(State::Entity { links })
    }

    fn resolve_on_entity(&self, info: &mut UriInfo, segment: &str, links: bool) -> UriResult<State> {
        if links {
            return Err(UriSyntaxError::SegmentNotAllowed {
                segment: segment.to_string(),
                after: "a link target",
            }
            .into());
        }
        match segment {
            "$links" => return Ok(State::AwaitingLinksNav),
            "$value" => {
                info.value = true;
                return Ok(State::AfterValue { on_property: false });
            }
            other if other.starts_with('$') => {
                return Err(UriSyntaxError::SegmentNotAllowed {
                    segment: segment.to_string(),
                    after: "a single entity",
                }
                .into());
            }
            _ => {}
        }

        let (name, key_text) = split_segment(segment)?;
        let entity_type = self.current_entity_type(info)?;

        if let Some(property) = entity_type.property(name) {
            if key_text.is_some() {
                return Err(UriSyntaxError::SegmentNotAllowed {
                    segment: segment.to_string(),
                    after: "a property",
                }
                .into());
            }
            info.property_path.push(Arc::clone(&property));
            return match &property.kind {
                PropertyKind::Complex(complex) => Ok(State::Complex(Arc::clone(complex))),
                PropertyKind::Simple(_) => Ok(State::Simple),
            };
        }

        if let Some(navigation) = entity_type.navigation(name) {
            let set = self.navigation_target_set(info, &navigation.target_set)?;
            let target_type = self.entity_type_of(&set)?;
            let mut key_predicates = Vec::new();
            let next = if navigation.to_many {
                match key_text {
                    Some(raw) => {
                        key_predicates = self.parse_key_predicates(raw, &target_type)?;
                        State::Entity { links: false }
                    }
                    None => State::Collection { links: false },
                }
            } else {
                if key_text.is_some() {
                    return Err(UriSyntaxError::SegmentNotAllowed {
                        segment: segment.to_string(),
                        after: "a to-one navigation",
                    }
                    .into());
                }
                State::Entity { links: false }
            };
            info.navigation_segments.push(NavigationSegment {
                navigation,
                entity_set: Arc::clone(&set),
                key_predicates,
            });
            info.target_entity_set = Some(set);
            info.target_entity_type = Some(target_type);
            return Ok(next);
        }

        Err(UriNotMatchingError::PropertyNotFound {
            name: name.to_string(),
            entity_type: entity_type.qualified_name(),
        }
        .into())
    }

    fn resolve_on_complex(
        &self,
        info: &mut UriInfo,
        segment: &str,
        complex: &Arc<ComplexType>,
    ) -> UriResult<State> {
        if segment.starts_with('$') {
            return Err(UriSyntaxError::SegmentNotAllowed {
                segment: segment.to_string(),
                after: "a complex property",
            }
            .into());
        }
        match complex.property(segment) {
            Some(property) => {
                info.property_path.push(Arc::clone(&property));
                match &property.kind {
                    PropertyKind::Complex(inner) => Ok(State::Complex(Arc::clone(inner))),
                    PropertyKind::Simple(_) => Ok(State::Simple),
                }
            }
            None => Err(UriNotMatchingError::PropertyNotFound {
                name: segment.to_string(),
                entity_type: complex.qualified_name(),
            }
            .into()),
        }
    }

    fn resolve_links_navigation(&self, info: &mut UriInfo, segment: &str) -> UriResult<State> {
        let (name, key_text) = split_segment(segment)?;
        let entity_type = self.current_entity_type(info)?;
        let Some(navigation) = entity_type.navigation(name) else {
            return Err(UriNotMatchingError::NavigationNotFound {
                name: name.to_string(),
                entity_type: entity_type.qualified_name(),
            }
            .into());
        };

        let set = self.navigation_target_set(info, &navigation.target_set)?;
        let target_type = self.entity_type_of(&set)?;
        let mut key_predicates = Vec::new();
        let next = if navigation.to_many {
            match key_text {
                Some(raw) => {
                    key_predicates = self.parse_key_predicates(raw, &target_type)?;
                    State::Entity { links: true }
                }
                None => State::Collection { links: true },
            }
        } else {
            State::Entity { links: true }
        };
        info.navigation_segments.push(NavigationSegment {
            navigation,
            entity_set: Arc::clone(&set),
            key_predicates,
        });
        info.target_entity_set = Some(set);
        info.target_entity_type = Some(target_type);
        Ok(next)
    }

    fn current_entity_type(&self, info: &UriInfo) -> UriResult<Arc<EntityType>> {
        info.target_entity_type
            .as_ref()
            .map(Arc::clone)
            .ok_or_else(|| {
                UriSyntaxError::MalformedSegment {
                    segment: String::new(),
                }
                .into()
            })
    }

    fn entity_type_of(&self, set: &Arc<EntitySet>) -> UriResult<Arc<EntityType>> {
        self.model.entity_type_of(set).ok_or_else(|| {
            UriNotMatchingError::UnknownResource {
                name: set.entity_type.clone(),
            }
            .into()
        })
    }

    fn navigation_target_set(&self, info: &UriInfo, set_name: &str) -> UriResult<Arc<EntitySet>> {
        self.model.entity_set(set_name).ok_or_else(|| {
            let on_type = info
                .target_entity_type
                .as_ref()
                .map(|t| t.qualified_name())
                .unwrap_or_default();
            UriNotMatchingError::PropertyNotFound {
                name: set_name.to_string(),
                entity_type: on_type,
            }
            .into()
        })
    }

    /// Parse and validate a key predicate body (parentheses stripped)
    /// against the entity type's declared key.
    fn parse_key_predicates(
        &self,
        raw: &str,
        entity_type: &Arc<EntityType>,
    ) -> UriResult<Vec<KeyPredicate>> {
        let key_properties = entity_type.key_properties();
        let parts = split_outside_quotes(raw, ',');
        if raw.trim().is_empty() {
            return Err(UriSyntaxError::MalformedKeyPredicate {
                predicate: raw.to_string(),
                reason: "empty key predicate".to_string(),
            }
            .into());
        }

        let named: Vec<Option<(usize, &str)>> = parts
            .iter()
            .map(|part| find_outside_quotes(part, '=').map(|i| (i, *part)))
            .collect();

        // Single positional value, or every part named, nothing in between.
        if parts.len() == 1 && named[0].is_none() {
            if key_properties.len() != 1 {
                return Err(UriSyntaxError::UnnamedCompoundKey {
                    entity_type: entity_type.qualified_name(),
                    count: key_properties.len(),
                }
                .into());
            }
            let property = Arc::clone(&key_properties[0]);
            let value = self.key_literal(parts[0], &property)?;
            return Ok(vec![KeyPredicate { property, value }]);
        }

        let mut resolved: Vec<Option<KeyPredicate>> = vec![None; key_properties.len()];
        for (part, named_part) in parts.iter().zip(named.iter()) {
            let Some((eq_index, _)) = named_part else {
                return Err(UriSyntaxError::MalformedKeyPredicate {
                    predicate: raw.to_string(),
                    reason: format!("'{part}' is not a name=value pair"),
                }
                .into());
            };
            let (name, literal) = part.split_at(*eq_index);
            let literal = &literal[1..];
            let Some(index) = key_properties.iter().position(|p| p.name == name) else {
                return Err(UriSyntaxError::NotAKeyProperty {
                    property: name.to_string(),
                    entity_type: entity_type.qualified_name(),
                }
                .into());
            };
            if resolved[index].is_some() {
                return Err(UriSyntaxError::DuplicateKeyProperty {
                    property: name.to_string(),
                }
                .into());
            }
            let property = Arc::clone(&key_properties[index]);
            let value = self.key_literal(literal, &property)?;
            resolved[index] = Some(KeyPredicate { property, value });
        }

        let predicates: Vec<KeyPredicate> = resolved.into_iter().flatten().collect();
        if predicates.len() != key_properties.len() {
            return Err(UriSyntaxError::KeyPredicateCount {
                entity_type: entity_type.qualified_name(),
                expected: key_properties.len(),
                actual: predicates.len(),
            }
            .into());
        }
        Ok(predicates)
    }

    fn key_literal(
        &self,
        text: &str,
        property: &Arc<crate::edm::Property>,
    ) -> UriResult<crate::ast::LiteralValue> {
        let parsed =
            parse_literal(text, 0).map_err(|source| UriSyntaxError::KeyLiteral { source })?;
        let expected = property
            .simple_type()
            .unwrap_or(crate::edm::EdmSimpleType::String);
        if !parsed.edm_type.is_promotable_to(expected) {
            return Err(UriSyntaxError::KeyPredicateType {
                property: property.name.clone(),
                expected: expected.name().to_string(),
                actual: parsed.edm_type.name().to_string(),
            }
            .into());
        }
        Ok(parsed.value)
    }

    fn apply_query_options(
        &self,
        info: &mut UriInfo,
        state: &State,
        options: &[(&str, &str)],
    ) -> UriResult<()> {
        let is_collection = matches!(
            state,
            State::Collection { .. } | State::AfterCount { .. }
        );
        let is_entity_target = matches!(
            state,
            State::Collection { links: false, .. } | State::Entity { links: false }
        );

        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for &(name, value) in options {
            if !name.starts_with('$') {
                info.custom_options
                    .insert(name.to_string(), value.to_string());
                continue;
            }
            if !seen.insert(name) {
                return Err(UriSyntaxError::DuplicateSystemOption {
                    option: name.to_string(),
                }
                .into());
            }
            match name {
                "$filter" => {
                    if !is_collection {
                        return Err(UriSyntaxError::OptionNotApplicable { option: "$filter" }.into());
                    }
                    let target = self.current_entity_type(info)?;
                    let filter = parse_filter(value, &target, self.model, &self.limits).map_err(
                        |source| UriSyntaxError::Expression {
                            option: "$filter",
                            source,
                        },
                    )?;
                    info.filter = Some(filter);
                }
                "$orderby" => {
                    if !is_collection {
                        return Err(
                            UriSyntaxError::OptionNotApplicable { option: "$orderby" }.into()
                        );
                    }
                    let target = self.current_entity_type(info)?;
                    let order_by = parse_order_by(value, &target, self.model, &self.limits)
                        .map_err(|source| UriSyntaxError::Expression {
                            option: "$orderby",
                            source,
                        })?;
                    info.order_by = Some(order_by);
                }
                "$select" => {
                    if !is_entity_target {
                        return Err(
                            UriSyntaxError::OptionNotApplicable { option: "$select" }.into()
                        );
                    }
                    let select = self.parse_select(info, value)?;
                    info.select = select;
                }
                "$expand" => {
                    if !is_entity_target {
                        return Err(
                            UriSyntaxError::OptionNotApplicable { option: "$expand" }.into()
                        );
                    }
                    let expand = self.parse_expand(info, value)?;
                    info.expand = expand;
                }
                "$top" => {
                    if !is_collection {
                        return Err(UriSyntaxError::OptionNotApplicable { option: "$top" }.into());
                    }
                    info.top = Some(parse_non_negative(value, "$top")?);
                }
                "$skip" => {
                    if !is_collection {
                        return Err(UriSyntaxError::OptionNotApplicable { option: "$skip" }.into());
                    }
                    info.skip = Some(parse_non_negative(value, "$skip")?);
                }
                "$skiptoken" => {
                    if !is_collection {
                        return Err(
                            UriSyntaxError::OptionNotApplicable { option: "$skiptoken" }.into()
                        );
                    }
                    info.skip_token = Some(value.to_string());
                }
                "$inlinecount" => {
                    if !is_collection {
                        return Err(
                            UriSyntaxError::OptionNotApplicable { option: "$inlinecount" }.into()
                        );
                    }
                    info.inline_count = Some(match value {
                        "allpages" => InlineCount::AllPages,
                        "none" => InlineCount::None,
                        _ => {
                            return Err(UriSyntaxError::InvalidOptionValue {
                                option: "$inlinecount",
                                value: value.to_string(),
                                reason: "must be 'allpages' or 'none'",
                            }
                            .into());
                        }
                    });
                }
                "$format" => {
                    info.format = Some(match value {
                        "atom" => Format::Atom,
                        "json" => Format::Json,
                        "xml" => Format::Xml,
                        custom if custom.contains('/') => Format::Custom(custom.to_string()),
                        _ => {
                            return Err(UriSyntaxError::InvalidOptionValue {
                                option: "$format",
                                value: value.to_string(),
                                reason: "must be 'atom', 'json', 'xml' or a MIME type",
                            }
                            .into());
                        }
                    });
                }
                other => {
                    return Err(UriSyntaxError::UnknownSystemOption {
                        option: other.to_string(),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    fn parse_select(&self, info: &UriInfo, value: &str) -> UriResult<Vec<SelectItem>> {
        let root = self.current_entity_type(info)?;
        let mut items = Vec::new();
        for item in value.split(',') {
            if item.is_empty() {
                return Err(UriSyntaxError::InvalidPath {
                    option: "$select",
                    path: item.to_string(),
                    reason: "empty select item",
                }
                .into());
            }
            let parts: Vec<&str> = item.split('/').collect();
            let mut current = Arc::clone(&root);
            let mut navigation = Vec::new();
            let mut property = None;
            let mut star = false;
            for (index, part) in parts.iter().enumerate() {
                let last = index == parts.len() - 1;
                if part.is_empty() {
                    return Err(UriSyntaxError::InvalidPath {
                        option: "$select",
                        path: item.to_string(),
                        reason: "empty path segment",
                    }
                    .into());
                }
                if *part == "*" {
                    if !last {
                        return Err(UriSyntaxError::InvalidPath {
                            option: "$select",
                            path: item.to_string(),
                            reason: "'*' must be the last segment",
                        }
                        .into());
                    }
                    star = true;
                } else if let Some(found) = current.property(part) {
                    if !last {
                        return Err(UriSyntaxError::InvalidPath {
                            option: "$select",
                            path: item.to_string(),
                            reason: "a property must be the last segment",
                        }
                        .into());
                    }
                    property = Some(found);
                } else if let Some(nav) = current.navigation(part) {
                    let set = self.navigation_target_set(info, &nav.target_set)?;
                    current = self.entity_type_of(&set)?;
                    navigation.push(nav);
                } else {
                    return Err(UriNotMatchingError::PropertyNotFound {
                        name: (*part).to_string(),
                        entity_type: current.qualified_name(),
                    }
                    .into());
                }
            }
            items.push(SelectItem {
                navigation,
                property,
                star,
            });
        }
        Ok(items)
    }

    fn parse_expand(
        &self,
        info: &UriInfo,
        value: &str,
    ) -> UriResult<Vec<Vec<Arc<crate::edm::NavigationProperty>>>> {
        let root = self.current_entity_type(info)?;
        let mut paths = Vec::new();
        for item in value.split(',') {
            if item.is_empty() {
                return Err(UriSyntaxError::InvalidPath {
                    option: "$expand",
                    path: item.to_string(),
                    reason: "empty expand item",
                }
                .into());
            }
            let mut current = Arc::clone(&root);
            let mut path = Vec::new();
            for part in item.split('/') {
                if part.is_empty() {
                    return Err(UriSyntaxError::InvalidPath {
                        option: "$expand",
                        path: item.to_string(),
                        reason: "empty path segment",
                    }
                    .into());
                }
                if let Some(nav) = current.navigation(part) {
                    let set = self.navigation_target_set(info, &nav.target_set)?;
                    current = self.entity_type_of(&set)?;
                    path.push(nav);
                } else if current.property(part).is_some() {
                    return Err(UriSyntaxError::InvalidPath {
                        option: "$expand",
                        path: item.to_string(),
                        reason: "only navigation properties can be expanded",
                    }
                    .into());
                } else {
                    return Err(UriNotMatchingError::PropertyNotFound {
                        name: part.to_string(),
                        entity_type: current.qualified_name(),
                    }
                    .into());
                }
            }
            paths.push(path);
        }
        Ok(paths)
    }
}

/// Split `Name(key)` into the name and the raw key text; a segment without
/// parentheses passes through unchanged.
fn split_segment(segment: &str) -> Result<(&str, Option<&str>), UriSyntaxError> {
    if segment.is_empty() {
        return Err(UriSyntaxError::MalformedSegment {
            segment: segment.to_string(),
        });
    }
    match find_outside_quotes(segment, '(') {
        None => {
            if segment.contains(')') {
                return Err(UriSyntaxError::MalformedSegment {
                    segment: segment.to_string(),
                });
            }
            Ok((segment, None))
        }
        Some(0) => Err(UriSyntaxError::MalformedSegment {
            segment: segment.to_string(),
        }),
        Some(open) => {
            if !segment.ends_with(')') {
                return Err(UriSyntaxError::MalformedSegment {
                    segment: segment.to_string(),
                });
            }
            let name = &segment[..open];
            let key = &segment[open + 1..segment.len() - 1];
            Ok((name, Some(key)))
        }
    }
}

/// Push key predicates onto the innermost pending target: the last
/// navigation segment when one exists, the start set otherwise.
fn push_keys(info: &mut UriInfo, keys: Vec<KeyPredicate>) {
    match info.navigation_segments.last_mut() {
        Some(segment) => segment.key_predicates = keys,
        None => info.key_predicates = keys,
    }
}

fn final_kind(info: &UriInfo, state: &State) -> UriResult<UriKind> {
    // Service document and metadata were decided during the walk.
    if matches!(info.kind, UriKind::ServiceDocument | UriKind::Metadata) {
        return Ok(info.kind);
    }
    Ok(match state {
        State::Collection { links: true, .. } | State::Entity { links: true } => UriKind::Links,
        State::AfterCount { links: true } => UriKind::Links,
        State::Collection { .. } | State::AfterCount { links: false } => UriKind::EntitySet,
        State::Entity { .. } => UriKind::Entity,
        State::Complex(_) => UriKind::ComplexProperty,
        State::Simple => UriKind::SimpleProperty,
        State::AfterValue { on_property: true } => UriKind::SimpleProperty,
        State::AfterValue { on_property: false } => UriKind::Entity,
        State::AwaitingLinksNav => {
            return Err(UriSyntaxError::SegmentNotAllowed {
                segment: "$links".to_string(),
                after: "the end of the path",
            }
            .into());
        }
    })
}

fn parse_non_negative(value: &str, option: &'static str) -> Result<u32, UriSyntaxError> {
    if value.starts_with('+') || value.starts_with('-') {
        return Err(UriSyntaxError::InvalidOptionValue {
            option,
            value: value.to_string(),
            reason: "must be a non-negative integer",
        });
    }
    value
        .parse::<u32>()
        .map_err(|_| UriSyntaxError::InvalidOptionValue {
            option,
            value: value.to_string(),
            reason: "must be a non-negative integer",
        })
}

/// Split on `separator`, ignoring separators inside quoted literals. The
/// `''` escape toggles the quote state twice and falls out naturally.
fn split_outside_quotes(text: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (index, ch) in text.char_indices() {
        if ch == '\'' {
            in_quotes = !in_quotes;
        } else if ch == separator && !in_quotes {
            parts.push(&text[start..index]);
            start = index + ch.len_utf8();
        }
    }
    parts.push(&text[start..]);
    parts
}

/// First occurrence of `needle` outside quoted literals.
fn find_outside_quotes(text: &str, needle: char) -> Option<usize> {
    let mut in_quotes = false;
    for (index, ch) in text.char_indices() {
        if ch == '\'' {
            in_quotes = !in_quotes;
        } else if ch == needle && !in_quotes {
            return Some(index);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::LiteralValue;
    use crate::edm::{EdmSimpleType, InMemoryModel, ModelBuilder, TypeRef};
    use pretty_assertions::assert_eq;

    fn model() -> Arc<InMemoryModel> {
        ModelBuilder::new("Test")
            .complex_type(
                "Address",
                vec![
                    ("Street", TypeRef::Simple(EdmSimpleType::String)),
                    ("City", TypeRef::Simple(EdmSimpleType::String)),
                ],
            )
            .entity_type(
                "Order",
                vec!["OrderId"],
                vec![
                    ("OrderId", TypeRef::Simple(EdmSimpleType::Int32)),
                    ("Total", TypeRef::Simple(EdmSimpleType::Decimal)),
                ],
                Vec::<(&str, &str, bool)>::new(),
            )
            .entity_type(
                "Employee",
                vec!["EmployeeId"],
                vec![
                    ("EmployeeId", TypeRef::Simple(EdmSimpleType::Int32)),
                    ("Name", TypeRef::Simple(EdmSimpleType::String)),
                    ("Price", TypeRef::Simple(EdmSimpleType::Decimal)),
                    ("Location", TypeRef::Complex("Address".to_string())),
                ],
                vec![("Orders", "Orders", true), ("Manager", "Employees", false)],
            )
            .entity_type(
                "Tag",
                vec!["Word", "Lang"],
                vec![
                    ("Word", TypeRef::Simple(EdmSimpleType::String)),
                    ("Lang", TypeRef::Simple(EdmSimpleType::String)),
                ],
                Vec::<(&str, &str, bool)>::new(),
            )
            .entity_set("Employees", "Employee")
            .entity_set("Orders", "Order")
            .entity_set("Tags", "Tag")
            .function_import("TopEmployees", "Employees", true)
            .build()
            .unwrap()
    }

    fn parse(segments: &[&str], options: &[(&str, &str)]) -> UriResult<UriInfo> {
        let model = model();
        UriParser::new(model.as_ref()).parse(segments, options)
    }

    #[test]
    fn empty_path_is_the_service_document() {
        let info = parse(&[], &[]).unwrap();
        assert_eq!(info.kind(), UriKind::ServiceDocument);
        assert!(info.target_entity_set().is_none());
    }

    #[test]
    fn metadata_segment() {
        let info = parse(&["$metadata"], &[]).unwrap();
        assert_eq!(info.kind(), UriKind::Metadata);
        assert!(parse(&["$metadata", "x"], &[]).is_err());
    }

    #[test]
    fn entity_set_and_inline_key() {
        let info = parse(&["Employees(5)"], &[]).unwrap();
        assert_eq!(info.kind(), UriKind::Entity);
        assert_eq!(info.key_predicates().len(), 1);
        assert_eq!(info.key_predicates()[0].property.name, "EmployeeId");
        assert_eq!(info.key_predicates()[0].value, LiteralValue::Int32(5));
    }

    #[test]
    fn standalone_key_segment_then_navigation() {
        let info = parse(&["Employees", "5", "Orders"], &[]).unwrap();
        assert_eq!(info.kind(), UriKind::EntitySet);
        assert_eq!(info.start_entity_set().unwrap().name, "Employees");
        assert_eq!(
            info.key_predicates()[0].property.name,
            "EmployeeId"
        );
        assert_eq!(info.key_predicates()[0].value, LiteralValue::Int32(5));
        assert_eq!(info.navigation_segments().len(), 1);
        assert_eq!(info.navigation_segments()[0].navigation.name, "Orders");
        assert_eq!(info.target_entity_set().unwrap().name, "Orders");
    }

    #[test]
    fn key_type_mismatch_is_a_syntax_error() {
        let err = parse(&["Employees('abc')"], &[]).unwrap_err();
        assert_eq!(err.http_status(), 400);
        assert!(matches!(
            err,
            UriError::Syntax(UriSyntaxError::KeyPredicateType { ref property, .. })
                if property == "EmployeeId"
        ));
    }

    #[test]
    fn named_compound_key_is_order_independent() {
        let info = parse(&["Tags(Lang='en',Word='hi')"], &[]).unwrap();
        let keys = info.key_predicates();
        assert_eq!(keys.len(), 2);
        // Normalized to declaration order.
        assert_eq!(keys[0].property.name, "Word");
        assert_eq!(keys[1].property.name, "Lang");
    }

    #[test]
    fn compound_key_rejects_unnamed_partial_and_foreign_names() {
        assert!(matches!(
            parse(&["Tags('hi')"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::UnnamedCompoundKey { .. })
        ));
        assert!(matches!(
            parse(&["Tags(Word='hi')"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::KeyPredicateCount { .. })
        ));
        assert!(matches!(
            parse(&["Tags(Word='hi',Nope='x')"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::NotAKeyProperty { .. })
        ));
        assert!(matches!(
            parse(&["Tags(Word='hi',Word='yo')"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::DuplicateKeyProperty { .. })
        ));
    }

    #[test]
    fn unknown_first_segment_is_not_matching() {
        let err = parse(&["Nope"], &[]).unwrap_err();
        assert_eq!(err.http_status(), 404);
    }

    #[test]
    fn unknown_property_is_not_matching() {
        let err = parse(&["Employees(5)", "Nope"], &[]).unwrap_err();
        assert!(matches!(
            err,
            UriError::NotMatching(UriNotMatchingError::PropertyNotFound { ref name, .. })
                if name == "Nope"
        ));
    }

    #[test]
    fn property_and_value_segments() {
        let info = parse(&["Employees(5)", "Location", "City"], &[]).unwrap();
        assert_eq!(info.kind(), UriKind::SimpleProperty);
        assert_eq!(info.property_path().len(), 2);

        let info = parse(&["Employees(5)", "Name", "$value"], &[]).unwrap();
        assert_eq!(info.kind(), UriKind::SimpleProperty);
        assert!(info.value());

        assert!(parse(&["Employees(5)", "Name", "$value", "x"], &[]).is_err());
    }

    #[test]
    fn count_links_and_function_imports() {
        let info = parse(&["Employees", "$count"], &[]).unwrap();
        assert_eq!(info.kind(), UriKind::EntitySet);
        assert!(info.count());

        let info = parse(&["Employees(5)", "$links", "Orders"], &[]).unwrap();
        assert_eq!(info.kind(), UriKind::Links);
        assert_eq!(info.navigation_segments()[0].navigation.name, "Orders");

        let info = parse(&["TopEmployees"], &[]).unwrap();
        assert_eq!(info.kind(), UriKind::EntitySet);
        assert!(info.function_import().is_some());

        assert!(matches!(
            parse(&["Employees(5)", "$links"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::SegmentNotAllowed { .. })
        ));
    }

    #[test]
    fn filter_and_orderby_delegate_to_the_expression_parser() {
        let info = parse(
            &["Employees"],
            &[("$filter", "Price gt 10"), ("$orderby", "Name desc")],
        )
        .unwrap();
        assert!(info.filter().is_some());
        assert_eq!(info.order_by().unwrap().orders().len(), 1);

        let err = parse(&["Employees"], &[("$filter", "Nope eq 1")]).unwrap_err();
        assert!(matches!(
            err,
            UriError::Syntax(UriSyntaxError::Expression {
                option: "$filter",
                ..
            })
        ));
    }

    #[test]
    fn filter_resolves_against_the_navigated_target_type() {
        let info = parse(&["Employees", "5", "Orders"], &[("$filter", "Total gt 10")]).unwrap();
        assert!(info.filter().is_some());
        // Employee properties are out of scope after navigating to Orders.
        assert!(parse(&["Employees", "5", "Orders"], &[("$filter", "Name eq 'x'")]).is_err());
    }

    #[test]
    fn paging_options_validate_their_values() {
        let info = parse(
            &["Employees"],
            &[
                ("$top", "10"),
                ("$skip", "0"),
                ("$skiptoken", "opaque"),
                ("$inlinecount", "allpages"),
            ],
        )
        .unwrap();
        assert_eq!(info.top(), Some(10));
        assert_eq!(info.skip(), Some(0));
        assert_eq!(info.skip_token(), Some("opaque"));
        assert_eq!(info.inline_count(), Some(InlineCount::AllPages));

        assert!(parse(&["Employees"], &[("$top", "-1")]).is_err());
        assert!(parse(&["Employees"], &[("$skip", "abc")]).is_err());
        assert!(parse(&["Employees"], &[("$inlinecount", "some")]).is_err());
    }

    #[test]
    fn format_accepts_the_fixed_set_and_mime_types() {
        let info = parse(&["Employees"], &[("$format", "json")]).unwrap();
        assert_eq!(info.format(), Some(&Format::Json));
        let info = parse(&["Employees"], &[("$format", "application/json;odata=verbose")]).unwrap();
        assert!(matches!(info.format(), Some(Format::Custom(_))));
        assert!(parse(&["Employees"], &[("$format", "yaml")]).is_err());
    }

    #[test]
    fn unknown_and_duplicate_system_options_are_rejected() {
        assert!(matches!(
            parse(&["Employees"], &[("$bogus", "1")]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::UnknownSystemOption { .. })
        ));
        assert!(matches!(
            parse(&["Employees"], &[("$top", "1"), ("$top", "2")]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::DuplicateSystemOption { .. })
        ));
    }

    #[test]
    fn custom_options_are_preserved_in_order() {
        let info = parse(&["Employees"], &[("b", "2"), ("a", "1")]).unwrap();
        let keys: Vec<&str> = info.custom_options().keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, ["b", "a"]);
    }

    #[test]
    fn select_and_expand_validate_against_the_model() {
        let info = parse(
            &["Employees"],
            &[("$select", "Name,Orders/Total,*"), ("$expand", "Orders")],
        )
        .unwrap();
        assert_eq!(info.select().len(), 3);
        assert!(info.select()[0].property.is_some());
        assert_eq!(info.select()[1].navigation.len(), 1);
        assert!(info.select()[2].star);
        assert_eq!(info.expand().len(), 1);

        assert!(matches!(
            parse(&["Employees"], &[("$select", "Nope")]).unwrap_err(),
            UriError::NotMatching(UriNotMatchingError::PropertyNotFound { .. })
        ));
        assert!(matches!(
            parse(&["Employees"], &[("$expand", "Name")]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::InvalidPath { .. })
        ));
        assert!(matches!(
            parse(&["Employees"], &[("$select", "*/Name")]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::InvalidPath { .. })
        ));
    }

    #[test]
    fn options_require_a_matching_target() {
        assert!(matches!(
            parse(&["Employees(5)"], &[("$top", "3")]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::OptionNotApplicable { .. })
        ));
        assert!(matches!(
            parse(&[], &[("$filter", "Name eq 'x'")]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::OptionNotApplicable { .. })
        ));
        // $format is representation-only and valid everywhere.
        assert!(parse(&[], &[("$format", "json")]).is_ok());
    }

    #[test]
    fn filter_on_count_target_is_allowed() {
        let info = parse(&["Employees", "$count"], &[("$filter", "Price gt 10")]).unwrap();
        assert!(info.count());
        assert!(info.filter().is_some());
    }

    #[test]
    fn misplaced_system_segments_are_syntax_errors() {
        assert!(matches!(
            parse(&["Employees(5)", "$count"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::SegmentNotAllowed { .. })
        ));
        assert!(matches!(
            parse(&["Employees", "$value"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::SegmentNotAllowed { .. })
        ));
        assert!(matches!(
            parse(&["Employees(5)", "Location", "$value"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::SegmentNotAllowed { .. })
        ));
    }

    #[test]
    fn segment_split_rejects_malformed_forms() {
        assert!(matches!(
            parse(&["Employees(5"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::MalformedSegment { .. })
        ));
        assert!(matches!(
            parse(&["(5)"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::MalformedSegment { .. })
        ));
        assert!(matches!(
            parse(&["Employees()"], &[]).unwrap_err(),
            UriError::Syntax(UriSyntaxError::MalformedKeyPredicate { .. })
        ));
    }

    #[test]
    fn string_keys_keep_embedded_separators() {
        let info = parse(&["Tags(Word='a,b',Lang='en')"], &[]).unwrap();
        assert_eq!(
            info.key_predicates()[0].value,
            LiteralValue::String("a,b".to_string())
        );
    }
}
