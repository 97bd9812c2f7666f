use sea_query::Iden;

/// Metadata table - key-value store for database configuration
#[derive(Iden)]
pub enum Metadata {
    Table,
    Key,
    Value,
}

/// Users table - registered accounts
#[derive(Iden)]
pub enum Users {
    Table,
    Id,
    Username,
    Email,
    Password,
    FullName,
    AvatarUrl,
    TotalGenerations,
    MonthlyQuota,
    CreatedAtMs,
    LastLoginAtMs,
}

/// Sessions table - server side login sessions keyed by an opaque token
#[derive(Iden)]
pub enum Sessions {
    Table,
    Token,
    UserId,
    CreatedAtMs,
    ExpiresAtMs,
}

/// Voices table - cached copy of the provider's voice catalog
#[derive(Iden)]
pub enum Voices {
    Table,
    Id,
    Name,
    Description,
    Language,
    Category,
    Premium,
    Gender,
    Accent,
    Age,
    UseCase,
    UpdatedAtMs,
}

/// Audio generations table - generation parameters, never audio bytes
#[derive(Iden)]
pub enum AudioGenerations {
    Table,
    Id,
    Text,
    VoiceId,
    VoiceName,
    Stability,
    Clarity,
    Format,
    AudioUrl,
    DurationSeconds,
    DownloadCount,
    OwnerId,
    CreatedAtMs,
}

/// Per user, per calendar day usage rollup
#[derive(Iden)]
pub enum UserDailyStats {
    Table,
    UserId,
    Day,
    GenerationCount,
    CharacterCount,
    AudioDurationSeconds,
}

/// Per voice usage counter
#[derive(Iden)]
pub enum VoiceUsageStats {
    Table,
    VoiceId,
    UseCount,
}
