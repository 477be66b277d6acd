mod test_projection_basic;
mod test_spherical_basic;
