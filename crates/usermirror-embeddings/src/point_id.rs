/// Integer key a user's index entry is stored under.
///
/// The first 8 hex digits of `md5(user_id)`, read as an unsigned integer, so
/// the key space is 32 bits wide. Distinct users can collide and a collision
/// overwrites the other user's entry; existing indexes depend on this exact
/// derivation, so it is kept as is.
pub fn point_id(user_id: &str) -> u64 {
    let digest = md5::compute(user_id.as_bytes());
    let prefix = [digest[0], digest[1], digest[2], digest[3]];
    u64::from(u32::from_be_bytes(prefix))
}
