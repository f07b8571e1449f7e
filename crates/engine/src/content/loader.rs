use std::collections::HashSet;
use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};
use tracing::info;

use crate::puzzle::{
    BehaviorKind, ExitTarget, InteractiveObject, Item, ObjectId, ObjectMessages, Rect, Room,
    UseEffect, UseRule, DEFAULT_ICON_COLOR,
};

use super::types::{ContentErrorCode, ContentLoadError, PuzzleDefinition, SourceLocation};

const DEFAULT_OBJECT_COLOR: [u8; 3] = [200, 200, 200];
const TOP_LEVEL_ELEMENTS: &str = "<Room>, <Combination> or <UseRule>";
const ALLOWED_BEHAVIORS: &str = "Exit, CodeContainer, KeyContainer, Collectible, Scenery";

pub fn load_puzzle_file(path: &Path) -> Result<PuzzleDefinition, ContentLoadError> {
    let raw = fs::read_to_string(path).map_err(|source| ContentLoadError {
        code: ContentErrorCode::ReadFile,
        message: format!("failed to read room definitions: {source}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    let definition = parse_puzzle_document(path, &raw)?;
    info!(
        path = %path.display(),
        rooms = definition.rooms.len(),
        objects = definition.object_count(),
        combinations = definition.combinations.len(),
        use_rules = definition.use_rules.len(),
        "puzzle_loaded"
    );
    Ok(definition)
}

pub fn parse_puzzle_document(
    file_path: &Path,
    raw: &str,
) -> Result<PuzzleDefinition, ContentLoadError> {
    let doc = Document::parse(raw).map_err(|error| ContentLoadError {
        code: ContentErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })?;
    let ctx = DocumentContext {
        file_path,
        doc: &doc,
    };

    let root = doc.root_element();
    if root.tag_name().name() != "Puzzle" {
        return Err(ctx.error(
            ContentErrorCode::InvalidRoot,
            "root element must be <Puzzle>".to_string(),
            root,
        ));
    }

    let mut definition = PuzzleDefinition::default();
    let mut room_ids = HashSet::<String>::new();
    let mut object_ids = HashSet::<String>::new();
    let mut pending_rules = Vec::<(Node<'_, '_>, PendingUseRule)>::new();

    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "Room" => {
                let room = parse_room(&ctx, child, &mut object_ids)?;
                if !room_ids.insert(room.id.as_str().to_string()) {
                    return Err(ctx.error(
                        ContentErrorCode::DuplicateId,
                        format!("duplicate room id '{}'", room.id),
                        child,
                    ));
                }
                definition.rooms.push(room);
            }
            "Combination" => {
                let (first, second, result) = parse_combination(&ctx, child)?;
                definition.combinations.register(&first, &second, result);
            }
            "UseRule" => pending_rules.push((child, parse_use_rule(&ctx, child)?)),
            other => {
                return Err(ctx.error(
                    ContentErrorCode::UnknownElement,
                    format!("unsupported element <{other}>; expected {TOP_LEVEL_ELEMENTS}"),
                    child,
                ))
            }
        }
    }

    if definition.rooms.is_empty() {
        return Err(ctx.error(
            ContentErrorCode::NoRooms,
            "<Puzzle> must contain at least one <Room>".to_string(),
            root,
        ));
    }

    // Targets may name objects from rooms declared after the rule.
    for (node, rule) in pending_rules {
        if let Some(target) = &rule.target {
            if !object_ids.contains(target) {
                return Err(ctx.error(
                    ContentErrorCode::DanglingReference,
                    format!("use rule targets unknown object '{target}'"),
                    node,
                ));
            }
        }
        definition.use_rules.insert(
            &rule.item,
            rule.target.map(ObjectId::new),
            UseRule {
                effect: rule.effect,
                message: rule.message,
            },
        );
    }

    Ok(definition)
}

struct DocumentContext<'a, 'input> {
    file_path: &'a Path,
    doc: &'a Document<'input>,
}

impl DocumentContext<'_, '_> {
    fn error(
        &self,
        code: ContentErrorCode,
        message: String,
        node: Node<'_, '_>,
    ) -> ContentLoadError {
        let pos = self.doc.text_pos_at(node.range().start);
        ContentLoadError {
            code,
            message,
            file_path: self.file_path.to_path_buf(),
            location: Some(SourceLocation {
                line: pos.row as usize,
                column: pos.col as usize,
            }),
        }
    }

    fn required_text(
        &self,
        node: Node<'_, '_>,
        field_name: &str,
    ) -> Result<String, ContentLoadError> {
        let value = node.text().map(str::trim).unwrap_or_default().to_string();
        if value.is_empty() {
            return Err(self.error(
                ContentErrorCode::MissingField,
                format!("field <{field_name}> must not be empty"),
                node,
            ));
        }
        Ok(value)
    }

    fn missing(&self, field_name: &str, parent: &str, node: Node<'_, '_>) -> ContentLoadError {
        self.error(
            ContentErrorCode::MissingField,
            format!("missing required field <{field_name}> in <{parent}>"),
            node,
        )
    }

    fn invalid(&self, message: String, node: Node<'_, '_>) -> ContentLoadError {
        self.error(ContentErrorCode::InvalidValue, message, node)
    }
}

/// Rejects a second occurrence of a single-valued field.
fn check_unique_field(
    ctx: &DocumentContext<'_, '_>,
    seen: &mut HashSet<String>,
    field: Node<'_, '_>,
    parent: &str,
) -> Result<(), ContentLoadError> {
    let name = field.tag_name().name();
    if !seen.insert(name.to_string()) {
        return Err(ctx.error(
            ContentErrorCode::DuplicateField,
            format!("duplicate field <{name}> in <{parent}>"),
            field,
        ));
    }
    Ok(())
}

fn parse_room(
    ctx: &DocumentContext<'_, '_>,
    node: Node<'_, '_>,
    object_ids: &mut HashSet<String>,
) -> Result<Room, ContentLoadError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut id: Option<String> = None;
    let mut name: Option<String> = None;
    let mut entry_message: Option<String> = None;
    let mut objects = Vec::<InteractiveObject>::new();
    let mut obstacles = Vec::<Rect>::new();

    for field in node.children().filter(|child| child.is_element()) {
        match field.tag_name().name() {
            "Object" => {
                let object = parse_object(ctx, field)?;
                if !object_ids.insert(object.id.as_str().to_string()) {
                    return Err(ctx.error(
                        ContentErrorCode::DuplicateId,
                        format!("duplicate object id '{}'; object ids are global", object.id),
                        field,
                    ));
                }
                objects.push(object);
            }
            "obstacle" => obstacles.push(parse_rect(ctx, field, "obstacle")?),
            "id" => {
                check_unique_field(ctx, &mut seen_fields, field, "Room")?;
                id = Some(ctx.required_text(field, "id")?);
            }
            "name" => {
                check_unique_field(ctx, &mut seen_fields, field, "Room")?;
                name = Some(ctx.required_text(field, "name")?);
            }
            "entryMessage" => {
                check_unique_field(ctx, &mut seen_fields, field, "Room")?;
                entry_message = Some(ctx.required_text(field, "entryMessage")?);
            }
            other => {
                return Err(ctx.error(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{other}> in <Room>"),
                    field,
                ))
            }
        }
    }

    let Some(id) = id else {
        return Err(ctx.missing("id", "Room", node));
    };
    let name = name.unwrap_or_else(|| id.clone());
    let mut room = Room::new(id, name, entry_message.unwrap_or_default());
    for object in objects {
        room.push_object(object);
    }
    for obstacle in obstacles {
        room.push_obstacle(obstacle);
    }
    Ok(room)
}

#[derive(Debug, Default)]
struct PendingObject {
    id: Option<String>,
    name: Option<String>,
    bounds: Option<Rect>,
    color: Option<[u8; 3]>,
    behavior: Option<String>,
    locked: bool,
    visible: bool,
    code: Option<String>,
    key: Option<String>,
    leads_to: Option<ExitTarget>,
    flavor: Option<String>,
    items: Vec<Item>,
    messages: ObjectMessages,
}

fn parse_object(
    ctx: &DocumentContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<InteractiveObject, ContentLoadError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut pending = PendingObject {
        visible: true,
        ..PendingObject::default()
    };
    let mut behavior_node = node;

    for field in node.children().filter(|child| child.is_element()) {
        let field_name = field.tag_name().name();
        if field_name == "Item" {
            pending.items.push(parse_item(ctx, field)?);
            continue;
        }
        check_unique_field(ctx, &mut seen_fields, field, "Object")?;

        match field_name {
            "id" => pending.id = Some(ctx.required_text(field, "id")?),
            "name" => pending.name = Some(ctx.required_text(field, "name")?),
            "bounds" => pending.bounds = Some(parse_rect(ctx, field, "bounds")?),
            "color" => pending.color = Some(parse_color(ctx, field, "color")?),
            "behavior" => {
                behavior_node = field;
                pending.behavior = Some(ctx.required_text(field, "behavior")?);
            }
            "locked" => pending.locked = parse_bool(ctx, field, "locked")?,
            "visible" => pending.visible = parse_bool(ctx, field, "visible")?,
            "code" => {
                let code = ctx.required_text(field, "code")?;
                if !code.chars().all(|ch| ch.is_ascii_digit()) {
                    return Err(
                        ctx.invalid(format!("code '{code}' must contain only digits"), field)
                    );
                }
                pending.code = Some(code);
            }
            "key" => pending.key = Some(ctx.required_text(field, "key")?),
            "leadsTo" => {
                let value = ctx.required_text(field, "leadsTo")?;
                pending.leads_to = Some(match value.as_str() {
                    "NextRoom" => ExitTarget::NextRoom,
                    "Escape" => ExitTarget::Escape,
                    _ => {
                        return Err(ctx.invalid(
                            format!("invalid leadsTo '{value}'; allowed values: NextRoom, Escape"),
                            field,
                        ))
                    }
                });
            }
            "flavor" => pending.flavor = Some(ctx.required_text(field, "flavor")?),
            "lockedMessage" => {
                pending.messages.locked = Some(ctx.required_text(field, "lockedMessage")?)
            }
            "unlockMessage" => {
                pending.messages.unlocked = Some(ctx.required_text(field, "unlockMessage")?)
            }
            "emptyMessage" => {
                pending.messages.empty = Some(ctx.required_text(field, "emptyMessage")?)
            }
            "passMessage" => {
                pending.messages.pass_through = Some(ctx.required_text(field, "passMessage")?)
            }
            other => {
                return Err(ctx.error(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{other}> in <Object>"),
                    field,
                ))
            }
        }
    }

    let Some(id) = pending.id.take() else {
        return Err(ctx.missing("id", "Object", node));
    };
    let Some(name) = pending.name.take() else {
        return Err(ctx.missing("name", "Object", node));
    };
    let Some(bounds) = pending.bounds else {
        return Err(ctx.missing("bounds", "Object", node));
    };
    let Some(behavior_name) = pending.behavior.take() else {
        return Err(ctx.missing("behavior", "Object", node));
    };

    let behavior = build_behavior(ctx, &behavior_name, &mut pending, behavior_node)?;
    let mut object = InteractiveObject::new(id, name, bounds, behavior)
        .locked(pending.locked)
        .with_color(pending.color.unwrap_or(DEFAULT_OBJECT_COLOR))
        .with_contents(pending.items)
        .with_messages(pending.messages);
    object.visible = pending.visible;
    object.required_code = pending.code;
    Ok(object)
}

fn build_behavior(
    ctx: &DocumentContext<'_, '_>,
    behavior_name: &str,
    pending: &mut PendingObject,
    node: Node<'_, '_>,
) -> Result<BehaviorKind, ContentLoadError> {
    if pending.code.is_some() && behavior_name != "CodeContainer" {
        return Err(ctx.invalid(
            format!("<code> is only valid for CodeContainer, not {behavior_name}"),
            node,
        ));
    }
    if pending.key.is_some() && !matches!(behavior_name, "Exit" | "KeyContainer") {
        return Err(ctx.invalid(
            format!("<key> is only valid for Exit or KeyContainer, not {behavior_name}"),
            node,
        ));
    }

    let behavior = match behavior_name {
        "Exit" => BehaviorKind::Exit {
            key: pending.key.take(),
            leads_to: pending.leads_to.unwrap_or(ExitTarget::NextRoom),
        },
        "CodeContainer" => {
            if pending.code.is_none() {
                return Err(ctx.missing("code", "Object", node));
            }
            BehaviorKind::CodeContainer
        }
        "KeyContainer" => match pending.key.take() {
            Some(key) => BehaviorKind::KeyContainer { key },
            None => return Err(ctx.missing("key", "Object", node)),
        },
        "Collectible" => {
            if pending.items.len() != 1 {
                return Err(ctx.invalid(
                    format!(
                        "Collectible needs exactly one <Item>, found {}",
                        pending.items.len()
                    ),
                    node,
                ));
            }
            BehaviorKind::Collectible {
                item: pending.items.remove(0),
            }
        }
        "Scenery" => match pending.flavor.take() {
            Some(flavor) => BehaviorKind::Scenery { flavor },
            None => return Err(ctx.missing("flavor", "Object", node)),
        },
        other => {
            return Err(ctx.invalid(
                format!("invalid behavior '{other}'; allowed values: {ALLOWED_BEHAVIORS}"),
                node,
            ))
        }
    };
    Ok(behavior)
}

fn parse_item(ctx: &DocumentContext<'_, '_>, node: Node<'_, '_>) -> Result<Item, ContentLoadError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut name: Option<String> = None;
    let mut description = String::new();
    let mut icon_color = DEFAULT_ICON_COLOR;

    for field in node.children().filter(|child| child.is_element()) {
        check_unique_field(ctx, &mut seen_fields, field, "Item")?;
        match field.tag_name().name() {
            "name" => name = Some(ctx.required_text(field, "name")?),
            "description" => description = ctx.required_text(field, "description")?,
            "iconColor" => icon_color = parse_color(ctx, field, "iconColor")?,
            other => {
                return Err(ctx.error(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{other}> in <Item>"),
                    field,
                ))
            }
        }
    }

    let Some(name) = name else {
        return Err(ctx.missing("name", "Item", node));
    };
    Ok(Item::new(name, description).with_icon_color(icon_color))
}

fn parse_combination(
    ctx: &DocumentContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<(String, String, Item), ContentLoadError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut first: Option<String> = None;
    let mut second: Option<String> = None;
    let mut result: Option<Item> = None;

    for field in node.children().filter(|child| child.is_element()) {
        check_unique_field(ctx, &mut seen_fields, field, "Combination")?;
        match field.tag_name().name() {
            "first" => first = Some(ctx.required_text(field, "first")?),
            "second" => second = Some(ctx.required_text(field, "second")?),
            "Item" => result = Some(parse_item(ctx, field)?),
            other => {
                return Err(ctx.error(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{other}> in <Combination>"),
                    field,
                ))
            }
        }
    }

    let Some(first) = first else {
        return Err(ctx.missing("first", "Combination", node));
    };
    let Some(second) = second else {
        return Err(ctx.missing("second", "Combination", node));
    };
    let Some(result) = result else {
        return Err(ctx.missing("Item", "Combination", node));
    };
    if first == second {
        return Err(ctx.invalid(format!("combination pairs '{first}' with itself"), node));
    }
    Ok((first, second, result))
}

#[derive(Debug)]
struct PendingUseRule {
    item: String,
    target: Option<String>,
    effect: UseEffect,
    message: Option<String>,
}

fn parse_use_rule(
    ctx: &DocumentContext<'_, '_>,
    node: Node<'_, '_>,
) -> Result<PendingUseRule, ContentLoadError> {
    let mut seen_fields = HashSet::<String>::new();
    let mut item: Option<String> = None;
    let mut target: Option<String> = None;
    let mut effect: Option<UseEffect> = None;
    let mut message: Option<String> = None;

    for field in node.children().filter(|child| child.is_element()) {
        check_unique_field(ctx, &mut seen_fields, field, "UseRule")?;
        match field.tag_name().name() {
            "item" => item = Some(ctx.required_text(field, "item")?),
            "target" => target = Some(ctx.required_text(field, "target")?),
            "effect" => {
                let value = ctx.required_text(field, "effect")?;
                effect = Some(match value.as_str() {
                    "Open" => UseEffect::Open,
                    "Inspect" => UseEffect::Inspect,
                    _ => {
                        return Err(ctx.invalid(
                            format!("invalid effect '{value}'; allowed values: Open, Inspect"),
                            field,
                        ))
                    }
                });
            }
            "message" => message = Some(ctx.required_text(field, "message")?),
            other => {
                return Err(ctx.error(
                    ContentErrorCode::UnknownField,
                    format!("unknown field <{other}> in <UseRule>"),
                    field,
                ))
            }
        }
    }

    let Some(item) = item else {
        return Err(ctx.missing("item", "UseRule", node));
    };
    let Some(effect) = effect else {
        return Err(ctx.missing("effect", "UseRule", node));
    };
    Ok(PendingUseRule {
        item,
        target,
        effect,
        message,
    })
}

fn parse_rect(
    ctx: &DocumentContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<Rect, ContentLoadError> {
    let value = ctx.required_text(node, field_name)?;
    let parts = parse_number_list::<i32>(&value, 4).ok_or_else(|| {
        ctx.invalid(
            format!("{field_name} '{value}' must be four integers: x,y,width,height"),
            node,
        )
    })?;
    let rect = Rect::new(parts[0], parts[1], parts[2], parts[3]);
    if rect.is_empty() {
        return Err(ctx.invalid(
            format!("{field_name} '{value}' must have positive width and height"),
            node,
        ));
    }
    Ok(rect)
}

fn parse_color(
    ctx: &DocumentContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<[u8; 3], ContentLoadError> {
    let value = ctx.required_text(node, field_name)?;
    let parts = parse_number_list::<u8>(&value, 3).ok_or_else(|| {
        ctx.invalid(
            format!("{field_name} '{value}' must be three values 0-255: r,g,b"),
            node,
        )
    })?;
    Ok([parts[0], parts[1], parts[2]])
}

fn parse_bool(
    ctx: &DocumentContext<'_, '_>,
    node: Node<'_, '_>,
    field_name: &str,
) -> Result<bool, ContentLoadError> {
    let value = ctx.required_text(node, field_name)?;
    match value.as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ctx.invalid(
            format!("{field_name} '{value}' must be true or false"),
            node,
        )),
    }
}

fn parse_number_list<T: std::str::FromStr>(raw: &str, expected: usize) -> Option<Vec<T>> {
    let values = raw
        .split(',')
        .map(|part| part.trim().parse::<T>().ok())
        .collect::<Option<Vec<_>>>()?;
    (values.len() == expected).then_some(values)
}
