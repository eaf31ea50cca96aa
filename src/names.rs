//! Fixed name tables: Luau keywords and builtin/global identifiers.
//!
//! Membership in either table protects a name from renaming for the whole
//! run, regardless of where it occurs.

use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Reserved words of the language. `continue`, `export` and `type` are
/// context-sensitive in Luau but are treated as reserved here so they are
/// never emitted as substitutes or renamed.
pub static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "if", "in",
        "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
        "continue", "export", "type",
    ]
    .into_iter()
    .collect()
});

/// Builtin globals, constructors, and well-known member names. Member names
/// are listed so that a bare reference to one (outside `.`/`:` context, where
/// the classifier already protects it) is still never renamed.
pub static BUILTINS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // Lua standard library
        "print", "warn", "error", "assert", "pcall", "xpcall", "loadstring", "tonumber",
        "tostring", "type", "pairs", "ipairs", "next", "select", "getfenv", "setfenv",
        "getmetatable", "setmetatable", "rawget", "rawset", "rawequal", "unpack", "table",
        "string", "math", "coroutine", "debug", "collectgarbage", "dofile", "gcinfo", "load",
        "loadfile", "newproxy",
        // Roblox globals that appear without dot/colon
        "game", "workspace", "script", "wait", "spawn", "delay", "tick", "time", "_G",
        "_VERSION", "shared", "plugin",
        // Roblox constructors
        "Instance", "Vector3", "Vector2", "CFrame", "UDim", "UDim2", "Color3", "BrickColor",
        "Enum", "require", "typeof", "Ray", "Axes", "Faces", "Region3", "Region3int16",
        "PhysicalProperties", "NumberRange", "NumberSequence", "NumberSequenceKeypoint",
        "ColorSequence", "ColorSequenceKeypoint", "Rect", "TweenInfo", "Random",
        "DockWidgetPluginGuiInfo", "PathWaypoint", "OverlapParams", "RaycastParams",
        "RaycastResult", "DateTime",
        // Utility modules
        "bit32", "utf8", "os", "task",
        // Common member names
        "GetService", "FindFirstChild", "FindFirstChildOfClass", "FindFirstChildWhichIsA",
        "WaitForChild", "IsA", "Clone", "Destroy", "GetChildren", "GetDescendants", "Name",
        "Parent", "ClassName", "Character", "LocalPlayer", "UserId", "DisplayName", "Humanoid",
        "HumanoidRootPart", "Head", "Torso", "LeftArm", "RightArm", "LeftLeg", "RightLeg",
        "Health", "MaxHealth", "WalkSpeed", "JumpPower", "Position", "Orientation", "Size",
        "Transparency", "CanCollide", "Anchored", "Material", "Color", "Reflectance",
        "Velocity", "RotVelocity", "Touched", "Changed", "ChildAdded", "ChildRemoved",
        "DescendantAdded", "DescendantRemoving", "GetPlayers", "GetPlayerByUserId",
        "GetPlayerFromCharacter", "PlayerAdded", "PlayerRemoving", "CharacterAdded",
        "CharacterRemoving", "Kick", "LoadCharacter", "TeamColor", "Team", "Neutral",
        "Connect", "Wait", "Fire", "Invoke", "InvokeServer", "FireServer", "InvokeClient",
        "FireClient", "OnServerEvent", "OnClientEvent", "Value", "Text", "TextLabel",
        "TextButton", "TextBox", "Visible", "BackgroundColor3", "BorderColor3", "TextColor3",
        "Font", "TextSize", "TextWrapped", "TextScaled",
    ]
    .into_iter()
    .collect()
});

pub fn is_keyword(name: &str) -> bool {
    KEYWORDS.contains(name)
}

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(name)
}
