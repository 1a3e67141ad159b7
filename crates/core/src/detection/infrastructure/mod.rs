pub mod replay_face_encoder;
