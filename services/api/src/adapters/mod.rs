pub mod canned_reply;
pub mod supabase;
pub mod supabase_auth;
pub mod supabase_rest;

pub use canned_reply::CannedReplyAdapter;
pub use supabase::SupabaseClient;
pub use supabase_auth::SupabaseAuthAdapter;
pub use supabase_rest::SupabaseRestAdapter;
